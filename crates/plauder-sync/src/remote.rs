//! Collaborator traits the synchronizer is built against.
//!
//! The remote chat service and the connectivity signal are trait objects so
//! the core stays independent of HTTP plumbing; an implementation decodes
//! the service's responses through [`plauder_shared::protocol`] and hands
//! back domain types.

use async_trait::async_trait;

use plauder_shared::protocol::SendAck;
use plauder_shared::{ChatId, Conversation, Message};

use crate::error::Result;

/// The remote chat service, as consumed by the synchronizer.
///
/// `fetch_messages` returns everything after `since_id` (0 means "from the
/// beginning"); the result may arrive unordered, the synchronizer sorts.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>>;

    async fn fetch_messages(&self, chat_id: &ChatId, since_id: u64) -> Result<Vec<Message>>;

    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<SendAck>;

    /// Send a PNG image with an optional caption.
    async fn send_image(
        &self,
        chat_id: &ChatId,
        png: &[u8],
        caption: Option<&str>,
    ) -> Result<SendAck>;

    async fn leave_conversation(&self, chat_id: &ChatId) -> Result<SendAck>;

    async fn delete_conversation(&self, chat_id: &ChatId) -> Result<SendAck>;
}

/// Runtime connectivity signal. Poll ticks are skipped entirely while the
/// runtime reports offline.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity stub for environments without an offline mode.
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// An image attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingImage {
    /// PNG-encoded image bytes handed to the server.
    pub png: Vec<u8>,
    /// Locally created preview reference shown while the send is pending.
    pub preview_url: Option<String>,
}

/// A user-authored message about to be sent: text, image, or both.
#[derive(Debug, Clone, Default)]
pub struct Outgoing {
    pub text: Option<String>,
    pub image: Option<OutgoingImage>,
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(png: Vec<u8>, caption: Option<String>, preview_url: Option<String>) -> Self {
        Self {
            text: caption,
            image: Some(OutgoingImage { png, preview_url }),
        }
    }
}
