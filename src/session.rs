use tracing::{debug, warn};

/// Conversation identity for one controller instance.
///
/// Starts out empty and takes whatever identifier the companion service
/// hands back on each successful chat reply. Nothing else writes it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user_id: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume an identifier obtained elsewhere, e.g. from the command line.
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_established(&self) -> bool {
        self.user_id.is_some()
    }

    /// Take the server's identifier, overwriting any previous value.
    pub fn adopt(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        match self.user_id.as_deref() {
            None => debug!(user_id = %user_id, "session established"),
            Some(current) if current != user_id => {
                warn!(previous = %current, user_id = %user_id, "server reassigned session id")
            }
            Some(_) => {}
        }
        self.user_id = Some(user_id);
    }

    /// Short form for status lines.
    pub fn short_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(|id| id.char_indices().nth(8).map_or(id, |(end, _)| &id[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_identity() {
        let session = SessionContext::new();
        assert!(session.user_id().is_none());
        assert!(!session.is_established());
    }

    #[test]
    fn adopt_overwrites() {
        let mut session = SessionContext::new();
        session.adopt("u1");
        assert_eq!(session.user_id(), Some("u1"));
        session.adopt("u1");
        assert_eq!(session.user_id(), Some("u1"));
        session.adopt("u2");
        assert_eq!(session.user_id(), Some("u2"));
    }

    #[test]
    fn independent_instances() {
        let mut a = SessionContext::new();
        let b = SessionContext::new();
        a.adopt("only-a");
        assert!(b.user_id().is_none());
    }

    #[test]
    fn short_id_truncates() {
        let session = SessionContext::with_user_id("0123456789abcdef");
        assert_eq!(session.short_id(), Some("01234567"));
        let short = SessionContext::with_user_id("abc");
        assert_eq!(short.short_id(), Some("abc"));
    }
}
