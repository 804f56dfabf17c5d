//! The local actor's identity.
//!
//! The server reports message senders inconsistently as either the user id
//! or the nickname, so "is this message mine" is an equality check against
//! both, trimmed and case-insensitive. The identity is an explicit value
//! passed into the synchronizer at construction, never ambient state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id as known to the server.
    pub user_id: String,
    /// Optional display nickname. Some responses report senders by nick.
    pub nick: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, nick: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nick,
        }
    }

    /// Whether a message sender string refers to the local actor.
    pub fn matches_sender(&self, sender: &str) -> bool {
        let sender = sender.trim().to_lowercase();
        if sender.is_empty() {
            return false;
        }
        if sender == self.user_id.trim().to_lowercase() {
            return true;
        }
        match &self.nick {
            Some(nick) => !nick.trim().is_empty() && sender == nick.trim().to_lowercase(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_user_id_case_insensitively() {
        let id = Identity::new("Alice42", None);
        assert!(id.matches_sender("alice42"));
        assert!(id.matches_sender("  ALICE42 "));
        assert!(!id.matches_sender("bob"));
    }

    #[test]
    fn matches_nick_when_present() {
        let id = Identity::new("u-1001", Some("Alice".into()));
        assert!(id.matches_sender("alice"));
        assert!(id.matches_sender("u-1001"));
        assert!(!id.matches_sender(""));
    }
}
