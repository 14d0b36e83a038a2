use std::str::FromStr;

use strum::{EnumIter, EnumString};

/// Emotion categories the companion service classifies messages into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Emotion {
    Anger,
    Sadness,
    Fear,
    Joy,
    Stress,
    Calm,
    SevereDistress,
    Neutral,
    /// Any label the client does not know about.
    #[strum(default)]
    Unrecognized(String),
}

/// Glyph appended to the metadata line when the server asks for escalation.
pub const ESCALATION_GLYPH: &str = "⚠️";

impl Emotion {
    pub fn parse(label: &str) -> Self {
        // `strum(default)` makes this infallible
        Emotion::from_str(label).unwrap_or_else(|_| Emotion::Unrecognized(label.to_string()))
    }

    /// Display icon; empty for categories without one.
    pub fn icon(&self) -> &'static str {
        match self {
            Emotion::Anger => "😡",
            Emotion::Sadness => "😢",
            Emotion::Fear => "😨",
            Emotion::Joy => "😊",
            Emotion::Stress => "😫",
            Emotion::Calm => "😌",
            Emotion::SevereDistress => "⚠️",
            Emotion::Neutral => "🙂",
            Emotion::Unrecognized(_) => "",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Emotion::Unrecognized(_))
    }
}

/// Confidence as a whole percentage, rounding halves up.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", (confidence * 100.0 + 0.5).floor())
}

/// Build the metadata line shown under a bot reply.
///
/// The raw label from the server is shown, not the parsed category, so
/// unrecognized labels still appear after an empty icon.
pub fn format_metadata(label: &str, confidence: f64, escalate: bool) -> String {
    let icon = Emotion::parse(label).icon();
    let warning = if escalate { ESCALATION_GLYPH } else { "" };
    format!(
        "{} {} ({}) {}",
        icon,
        label,
        format_confidence(confidence),
        warning
    )
}
