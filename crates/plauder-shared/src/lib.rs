//! # plauder-shared
//!
//! Domain models and pure logic shared by the Plauder crates: conversation
//! and message types, the dual server/placeholder message-id space, local
//! identity matching, timestamp parsing, the message merge algorithm, and
//! the typed decode contract for the remote chat service's responses.

pub mod identity;
pub mod merge;
pub mod models;
pub mod protocol;
pub mod timestamp;
pub mod types;

mod error;

pub use error::DecodeError;
pub use identity::Identity;
pub use models::{Conversation, Message};
pub use types::{ChatId, MessageId, Role};
