//! Domain model structs cached locally and handed to the UI layer.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be stored as
//! JSON in the local cache and passed across the UI boundary unchanged.

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, Role};

/// A named chat thread the local actor participates in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Opaque server-assigned identifier.
    pub id: ChatId,
    /// Display label.
    pub name: String,
    /// The local actor's role in this conversation.
    #[serde(default)]
    pub role: Role,
}

/// A single chat message.
///
/// `created_at` is kept as the raw string the server delivered; ordering
/// always goes through [`crate::timestamp::parse_created_at`] so unparsable
/// values degrade to the id tie-break instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server id (numeric string) or local placeholder id (`temp-…`).
    pub id: MessageId,
    /// The conversation this message belongs to.
    pub chat_id: ChatId,
    /// Author identity as reported by the server (user id or nickname).
    pub sender: String,
    /// Message text. `None` when the message is an image without caption.
    pub content: Option<String>,
    /// Resolvable URL of an attached image, if any.
    pub image_url: Option<String>,
    /// Timestamp string: ISO-8601 or `YYYY-MM-DD_HH-MM-SS`.
    pub created_at: String,
}

impl Message {
    pub fn is_placeholder(&self) -> bool {
        self.id.is_placeholder()
    }
}
