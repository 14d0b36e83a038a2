use crate::api::{ChatReply, HistoryEntry, MoodStats};

/// Who a transcript turn belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    /// Local notes: help text, history listings, notices
    System,
}

impl Role {
    pub fn icon(&self) -> &'static str {
        match self {
            Role::User => "👤",
            Role::Bot => "🤖",
            Role::System => "⚙️",
        }
    }
}

/// Results of background work, delivered back to the conversation
/// controller on the UI loop.
#[derive(Debug, Clone)]
pub enum ResponseEvent {
    /// A chat request completed
    Reply(ChatReply),
    /// A chat request failed; carries the failure description
    ChatFailed(String),
    /// Stats arrived for the dashboard
    Stats(MoodStats),
    /// Server-side history for the session
    History(Vec<HistoryEntry>),
    /// Dictation produced a transcript
    Dictated(String),
}
