//! In-memory fakes for the synchronizer's collaborators, used across the
//! crate's test modules.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use plauder_shared::protocol::SendAck;
use plauder_shared::{ChatId, Conversation, Message, MessageId};

use crate::error::{Result, SyncError};
use crate::remote::{ChatApi, Connectivity};

/// Cached-message helper: authored by "bob" so it never matches the test
/// identity ("alice") during placeholder reconciliation.
pub fn msg(id: &str, created_at: &str, content: &str) -> Message {
    Message {
        id: MessageId::from(id),
        chat_id: ChatId::from("c1"),
        sender: "bob".into(),
        content: Some(content.into()),
        image_url: None,
        created_at: created_at.into(),
    }
}

pub fn server_msg(id: u64, sender: &str, content: &str, created_at: &str) -> Message {
    Message {
        id: MessageId::from(id),
        chat_id: ChatId::from("c1"),
        sender: sender.into(),
        content: Some(content.into()),
        image_url: None,
        created_at: created_at.into(),
    }
}

/// Scripted stand-in for the remote chat service.
///
/// Holds a canonical server-side message list; accepted sends are stored
/// under the next numeric id with "alice" as the author, matching the test
/// identity.
#[derive(Default)]
pub struct MockApi {
    pub server_messages: Mutex<Vec<Message>>,
    pub server_conversations: Mutex<Vec<Conversation>>,
    pub fetch_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub membership_calls: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub reject_send: AtomicBool,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    pub fn push(&self, message: Message) {
        self.server_messages.lock().unwrap().push(message);
    }

    pub fn set_conversations(&self, list: Vec<Conversation>) {
        *self.server_conversations.lock().unwrap() = list;
    }

    /// Park every subsequent fetch on `gate` until notified.
    pub fn set_fetch_gate(&self, gate: Arc<Notify>) {
        *self.fetch_gate.lock().unwrap() = Some(gate);
    }

    fn accept_send(&self, chat_id: &ChatId, content: Option<&str>, photo: bool) -> Result<SendAck> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_send.load(Ordering::SeqCst) {
            return Ok(SendAck {
                ok: false,
                message_id: None,
                detail: Some("abgelehnt".into()),
            });
        }

        let mut messages = self.server_messages.lock().unwrap();
        let id = messages
            .iter()
            .filter_map(|m| m.id.numeric())
            .max()
            .unwrap_or(0)
            + 1;
        messages.push(Message {
            id: MessageId::from(id),
            chat_id: chat_id.clone(),
            sender: "alice".into(),
            content: content.map(String::from),
            image_url: photo.then(|| format!("photo:{id}")),
            created_at: Utc::now().to_rfc3339(),
        });

        Ok(SendAck {
            ok: true,
            message_id: Some(id),
            detail: None,
        })
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("simulated fetch failure".into()));
        }
        Ok(self.server_conversations.lock().unwrap().clone())
    }

    async fn fetch_messages(&self, _chat_id: &ChatId, since_id: u64) -> Result<Vec<Message>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("simulated fetch failure".into()));
        }

        Ok(self
            .server_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.id.numeric().is_some_and(|n| n > since_id))
            .cloned()
            .collect())
    }

    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<SendAck> {
        self.accept_send(chat_id, Some(text), false)
    }

    async fn send_image(
        &self,
        chat_id: &ChatId,
        _png: &[u8],
        caption: Option<&str>,
    ) -> Result<SendAck> {
        self.accept_send(chat_id, caption, true)
    }

    async fn leave_conversation(&self, _chat_id: &ChatId) -> Result<SendAck> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SendAck {
            ok: true,
            message_id: None,
            detail: None,
        })
    }

    async fn delete_conversation(&self, _chat_id: &ChatId) -> Result<SendAck> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SendAck {
            ok: true,
            message_id: None,
            detail: None,
        })
    }
}

/// Connectivity flag that tests can flip at runtime.
pub struct SwitchedOnline(AtomicBool);

impl SwitchedOnline {
    pub fn new(online: bool) -> Self {
        Self(AtomicBool::new(online))
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for SwitchedOnline {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
