//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing required field,
    /// or a value of the wrong type. The route answers these with
    /// "request is invalid".
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
