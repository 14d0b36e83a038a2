use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Panel holding the advisory string from the latest bot reply
#[derive(Debug, Clone, Default)]
pub struct SuggestionPanel {
    content: Option<String>,
}

impl SuggestionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the panel's content; `None` or an empty string clears it.
    pub fn replace(&mut self, suggestion: Option<&str>) {
        self.content = suggestion
            .filter(|text| !text.is_empty())
            .map(|text| format!("💡 {}", text));
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

impl Widget for &SuggestionPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Suggestion")
            .border_style(Style::default().fg(Color::DarkGray));

        let line = match &self.content {
            Some(text) => Line::from(Span::styled(
                text.clone(),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(""),
        };

        Paragraph::new(line)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_overwrites_previous_content() {
        let mut panel = SuggestionPanel::new();
        panel.replace(Some("Try a short walk"));
        panel.replace(Some("Drink some water"));
        assert_eq!(panel.content(), Some("💡 Drink some water"));
    }

    #[test]
    fn missing_suggestion_clears() {
        let mut panel = SuggestionPanel::new();
        panel.replace(Some("Try a short walk"));
        panel.replace(None);
        assert!(panel.is_empty());
    }

    #[test]
    fn empty_suggestion_clears() {
        let mut panel = SuggestionPanel::new();
        panel.replace(Some("Try a short walk"));
        panel.replace(Some(""));
        assert!(panel.is_empty());
        assert_eq!(panel.content(), None);
    }
}
