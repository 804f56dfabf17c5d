//! # plauder-store
//!
//! Durable local cache for the Plauder chat client, backed by SQLite.
//!
//! The store holds three logical tables per the offline-first design: the
//! last known conversation list (single key), the ordered message list per
//! conversation, and numeric metadata per key (the per-conversation
//! watermark). Values are whole JSON lists replaced atomically, so a reload
//! always sees a consistent snapshot. Pure storage; no network.

pub mod conversations;
pub mod database;
pub mod messages;
pub mod migrations;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
