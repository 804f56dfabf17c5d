//! Cache operations for per-conversation message lists and watermarks.
//!
//! The watermark (`last_from_id:<chat>` in the `meta` table) is the highest
//! numeric message id observed for a conversation and bounds incremental
//! fetches. It is only ever written together with the message list it was
//! derived from, inside one transaction, so the two cannot fall out of sync.
//! It is also monotonically non-decreasing: persisted state only advances.

use rusqlite::{params, OptionalExtension};

use plauder_shared::merge::{max_numeric_id, merge_by_id};
use plauder_shared::{ChatId, Message};

use crate::database::Database;
use crate::error::Result;

fn watermark_key(chat_id: &ChatId) -> String {
    format!("last_from_id:{chat_id}")
}

impl Database {
    /// Return the persisted message list for a conversation, or empty if
    /// none is cached. The list is stored pre-sorted by the last writer.
    pub fn get_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM messages WHERE chat_id = ?1",
                params![chat_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the stored message list for a conversation and recompute the
    /// watermark from it, in a single transaction.
    ///
    /// The new watermark is `max(numeric(id))` over the list, floored at the
    /// previously stored value so the cursor never moves backwards even if a
    /// caller writes a truncated list.
    pub fn set_messages(&mut self, chat_id: &ChatId, list: &[Message]) -> Result<()> {
        let json = serde_json::to_string(list)?;
        let key = watermark_key(chat_id);

        let tx = self.conn_mut().transaction()?;

        let previous: Option<u64> = tx
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |r| {
                r.get(0)
            })
            .optional()?;
        let watermark = max_numeric_id(list).max(previous.unwrap_or(0));

        tx.execute(
            "INSERT OR REPLACE INTO messages (chat_id, value) VALUES (?1, ?2)",
            params![chat_id.as_str(), json],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, watermark],
        )?;
        tx.commit()?;

        tracing::debug!(chat_id = %chat_id, messages = list.len(), watermark, "cache updated");
        Ok(())
    }

    /// Return the persisted watermark for a conversation, defaulting to 0
    /// ("fetch from the beginning") if absent.
    pub fn get_watermark(&self, chat_id: &ChatId) -> Result<u64> {
        let value: Option<u64> = self
            .conn()
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![watermark_key(chat_id)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    /// Merge `new_messages` into the persisted list and store the result.
    /// No-op when `new_messages` is empty.
    pub fn append_messages(&mut self, chat_id: &ChatId, new_messages: &[Message]) -> Result<()> {
        if new_messages.is_empty() {
            return Ok(());
        }

        let old = self.get_messages(chat_id)?;
        let merged = merge_by_id(&old, new_messages);
        self.set_messages(chat_id, &merged)
    }

    /// The temporally-last persisted message, or `None` if nothing is
    /// cached. Used to build conversation-list previews.
    pub fn get_last_message(&self, chat_id: &ChatId) -> Result<Option<Message>> {
        Ok(self.get_messages(chat_id)?.into_iter().last())
    }

    /// Drop a conversation's cached messages and watermark, after a leave or
    /// delete was acknowledged by the server.
    pub fn remove_conversation_data(&mut self, chat_id: &ChatId) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "DELETE FROM messages WHERE chat_id = ?1",
            params![chat_id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM meta WHERE key = ?1",
            params![watermark_key(chat_id)],
        )?;
        tx.commit()?;

        tracing::debug!(chat_id = %chat_id, "conversation cache dropped");
        Ok(())
    }
}
