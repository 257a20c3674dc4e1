/// Errors raised while encoding or interpreting protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text is not a valid envelope, or the envelope is not a valid request.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// `SET_PARAM` named a parameter this bridge does not know.
    #[error("unsupported parameter '{0}'")]
    UnsupportedParameter(String),

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
