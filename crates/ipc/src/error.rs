//! Errors raised while encoding or decoding bridge messages.

/// Failures at the JSON boundary between the core and the UI.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Failed to encode core message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Malformed UI message: {0}")]
    Decode(String),
}
