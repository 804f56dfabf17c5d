use thiserror::Error;

/// Errors produced while decoding remote service responses.
///
/// Decoding fails loudly: a response that does not match the documented
/// contract is reported, never silently defaulted.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The response body is not valid JSON or misses required fields.
    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// A server message id did not parse as an unsigned integer. The
    /// watermark contract requires numeric, monotonically increasing ids.
    #[error("Server message id is not numeric: {0:?}")]
    NonNumericId(String),

    /// The acknowledgment carried no recognizable status field.
    #[error("Acknowledgment missing status")]
    MissingStatus,
}
