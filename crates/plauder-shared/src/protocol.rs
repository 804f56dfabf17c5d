//! Typed decode contract for the remote chat service's JSON responses.
//!
//! The service historically forced clients into defensive multi-key probing
//! (`res | res.messages | res.result`, `usernick || userid`). This module
//! replaces that with one documented shape per response type and fails
//! loudly when a response does not match, instead of silently defaulting.
//!
//! Documented contract:
//! - messages:      `{"messages": [{"id", "chatid", "usernick", "text", "time", "photoid"?}]}`
//! - conversations: `{"chats": [{"id", "name", "role"?}]}`
//! - acknowledgment:`{"status": "ok" | <error>, "message-id"?, "message"?}`

use serde::Deserialize;

use crate::error::DecodeError;
use crate::models::{Conversation, Message};
use crate::types::{ChatId, MessageId, Role};

/// Where attached photos are served from. An incoming `photoid` is resolved
/// to a fetchable URL from this base plus the access token.
#[derive(Debug, Clone)]
pub struct PhotoSource {
    pub base_url: String,
    pub token: String,
}

impl PhotoSource {
    pub fn url_for(&self, photo_id: &str) -> String {
        format!(
            "{}?request=getphoto&photoid={}&token={}",
            self.base_url, photo_id, self.token
        )
    }
}

/// Server ids arrive as JSON numbers or numeric strings depending on the
/// endpoint. Both are accepted; anything non-numeric is a contract
/// violation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Text(String),
}

impl RawId {
    fn validate(self) -> Result<u64, DecodeError> {
        match self {
            RawId::Num(n) => Ok(n),
            RawId::Text(s) => s
                .parse::<u64>()
                .map_err(|_| DecodeError::NonNumericId(s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<MessageRow>,
}

#[derive(Debug, Deserialize)]
struct MessageRow {
    id: RawId,
    chatid: Option<String>,
    usernick: String,
    text: Option<String>,
    time: Option<String>,
    photoid: Option<String>,
}

/// Decode a `getmessages` response body into domain messages.
///
/// `chat_id` is the conversation the fetch was issued for; rows without an
/// explicit `chatid` belong to it. Photo attachments are resolved through
/// `photos` when provided, otherwise the attachment reference is dropped.
pub fn decode_messages(
    body: &str,
    chat_id: &ChatId,
    photos: Option<&PhotoSource>,
) -> Result<Vec<Message>, DecodeError> {
    let response: MessagesResponse = serde_json::from_str(body)?;

    let mut messages = Vec::with_capacity(response.messages.len());
    for row in response.messages {
        let id = row.id.validate()?;
        messages.push(Message {
            id: MessageId::from(id),
            chat_id: row.chatid.map(ChatId).unwrap_or_else(|| chat_id.clone()),
            sender: row.usernick,
            content: row.text,
            image_url: match (row.photoid, photos) {
                (Some(pid), Some(src)) => Some(src.url_for(&pid)),
                _ => None,
            },
            // Empty timestamps are unparsable on purpose; ordering falls
            // back to the numeric id tie-break.
            created_at: row.time.unwrap_or_default(),
        });
    }
    Ok(messages)
}

#[derive(Debug, Deserialize)]
struct ConversationsResponse {
    chats: Vec<ConversationRow>,
}

#[derive(Debug, Deserialize)]
struct ConversationRow {
    id: String,
    name: String,
    role: Option<String>,
}

/// Decode a `getchats` response body into domain conversations.
pub fn decode_conversations(body: &str) -> Result<Vec<Conversation>, DecodeError> {
    let response: ConversationsResponse = serde_json::from_str(body)?;
    Ok(response
        .chats
        .into_iter()
        .map(|row| Conversation {
            id: ChatId(row.id),
            name: row.name,
            role: row.role.as_deref().map(Role::from_label).unwrap_or_default(),
        })
        .collect())
}

/// Outcome of a send (`postmessage`) or membership mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    /// Whether the server accepted the request.
    pub ok: bool,
    /// Id the server assigned to the stored message, when echoed.
    pub message_id: Option<u64>,
    /// Human-readable detail accompanying a rejection.
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    status: Option<String>,
    #[serde(rename = "message-id")]
    message_id: Option<RawId>,
    message: Option<String>,
}

/// Decode an acknowledgment body. A missing status field is a contract
/// violation, not an implicit success.
pub fn decode_ack(body: &str) -> Result<SendAck, DecodeError> {
    let response: AckResponse = serde_json::from_str(body)?;
    let status = response.status.ok_or(DecodeError::MissingStatus)?;

    let message_id = match response.message_id {
        Some(raw) => Some(raw.validate()?),
        None => None,
    };

    Ok(SendAck {
        ok: status.trim().eq_ignore_ascii_case("ok"),
        message_id,
        detail: response.message,
    })
}
