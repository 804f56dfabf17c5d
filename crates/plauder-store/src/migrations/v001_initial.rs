//! v001 -- Initial schema creation.
//!
//! Creates the three key-value tables of the offline cache: `conversations`,
//! `messages`, and `meta`. Values are whole JSON documents (or a plain
//! integer for `meta`) replaced atomically per key.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Conversations: the full last-known list under a single key.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversations (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL                 -- JSON array of Conversation
);

-- ----------------------------------------------------------------
-- Messages: the full ordered list per conversation.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    chat_id TEXT PRIMARY KEY NOT NULL,
    value   TEXT NOT NULL               -- JSON array of Message
);

-- ----------------------------------------------------------------
-- Meta: numeric metadata per key (per-conversation watermarks).
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY NOT NULL,
    value INTEGER NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
