use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable conversation identifier assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Prefix marking a locally generated, not-yet-confirmed message id.
///
/// Server ids are numeric strings; placeholder ids carry this prefix plus a
/// UUID so the two id spaces can never collide.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

/// Message identifier.
///
/// Two id spaces coexist: server ids (numeric strings, larger generally
/// means later) and local placeholder ids (`temp-<uuid>`). A placeholder id
/// never contributes to the watermark and must be removed once the matching
/// server message is observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh placeholder id for an optimistic local message.
    pub fn placeholder() -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Numeric value of a server id, `None` for placeholders and anything
    /// else that does not parse.
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The local actor's role in a conversation. Governs whether it may delete
/// the conversation (owner) or merely leave it (member).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
    #[default]
    None,
}

impl Role {
    /// Normalize a server-provided role label. The service is not consistent
    /// about casing or surrounding whitespace.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "owner" => Role::Owner,
            "member" => Role::Member,
            _ => Role::None,
        }
    }
}
