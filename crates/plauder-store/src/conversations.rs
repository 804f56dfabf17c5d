//! Cache operations for the conversation list.
//!
//! The full list lives under a single key and is replaced atomically;
//! absence is represented as an empty list, never as an error.

use rusqlite::{params, OptionalExtension};

use plauder_shared::Conversation;

use crate::database::Database;
use crate::error::Result;

/// The one key the conversation list is stored under.
const CONVERSATIONS_KEY: &str = "all";

impl Database {
    /// Return the last persisted conversation list, or empty if none.
    pub fn get_conversations(&self) -> Result<Vec<Conversation>> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM conversations WHERE key = ?1",
                params![CONVERSATIONS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the full stored conversation list.
    pub fn set_conversations(&self, list: &[Conversation]) -> Result<()> {
        let json = serde_json::to_string(list)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO conversations (key, value) VALUES (?1, ?2)",
            params![CONVERSATIONS_KEY, json],
        )?;
        Ok(())
    }
}
