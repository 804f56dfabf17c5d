//! # plauder-sync
//!
//! The message synchronizer of the Plauder chat client. For each open
//! conversation it reconciles the persisted cache, freshly fetched server
//! state, and optimistic local sends into one consistent, ordered message
//! list, while maintaining a per-conversation watermark for incremental
//! polling.
//!
//! The remote service and the connectivity signal are trait collaborators
//! ([`remote::ChatApi`], [`remote::Connectivity`]); an implementation is
//! expected to decode responses through `plauder_shared::protocol`. The
//! cache is the `plauder-store` database behind an `Arc<Mutex<..>>`; all
//! mutation for one conversation is serialized inside that conversation's
//! session actor.
//!
//! Typical use:
//! - [`feed::Feed`] for the conversation list (cached, then refreshed).
//! - [`task::spawn_session`] when entering a conversation: returns a
//!   [`task::SessionHandle`] exposing the observable message list, send and
//!   refresh methods, and teardown.

pub mod feed;
pub mod remote;
pub mod session;
pub mod task;

mod error;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Result, SyncError};
pub use feed::{ConversationPreview, Feed};
pub use remote::{ChatApi, Connectivity, Outgoing, OutgoingImage};
pub use session::SessionState;
pub use task::{spawn_session, SessionHandle, SyncConfig};
