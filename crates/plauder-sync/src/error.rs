use thiserror::Error;

/// Errors produced by the synchronizer.
///
/// Storage and fetch failures are recovered locally where possible (the view
/// degrades to cached or stale state); send failures always reach the
/// caller, because silently losing a user-authored message is unacceptable.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Cache read/write rejected by the store layer.
    #[error("Cache store error: {0}")]
    Store(#[from] plauder_store::StoreError),

    /// The cache store lock was poisoned by a panicking writer.
    #[error("Cache store unavailable")]
    StoreUnavailable,

    /// The remote service failed or was unreachable.
    #[error("Remote service error: {0}")]
    Remote(String),

    /// A response did not match the documented service contract.
    #[error("Response decode error: {0}")]
    Decode(#[from] plauder_shared::DecodeError),

    /// The server acknowledged a send with a non-success status.
    #[error("Send rejected by server: {0}")]
    SendRejected(String),

    /// An outgoing message had neither text nor an image attached.
    #[error("Outgoing message is empty")]
    EmptySend,

    /// The conversation no longer exists on the server.
    #[error("Conversation no longer exists on the server")]
    ConversationGone,

    /// Only the conversation owner may delete it.
    #[error("Only the owner may delete a conversation")]
    NotOwner,

    /// The session actor was torn down before the request completed.
    #[error("Session closed")]
    SessionClosed,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;
