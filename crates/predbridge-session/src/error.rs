use std::time::Duration;

use predbridge_channel::ChannelError;
use predbridge_protocol::{ProtocolError, Slot};

use crate::params::ParamError;
use crate::predictor::PredictorError;

/// Errors raised while running a session.
///
/// Only [`SessionError::ChannelBroken`] ends a session; every other variant is
/// reported to the host as a failure response.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The channel failed mid-session.
    #[error("channel broken: {0}")]
    ChannelBroken(ChannelError),

    /// No message arrived within the receive timeout.
    #[error("no message within {0:?}")]
    ChannelTimeout(Duration),

    /// The incoming text is not a valid request.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// `SET_PARAM` named an unknown parameter.
    #[error("unsupported parameter '{0}'")]
    UnsupportedParameter(String),

    /// `SET_PARAM` carried a value of the wrong type or range.
    #[error(transparent)]
    InvalidParameterValue(#[from] ParamError),

    /// The addressed slot has not been initialized yet.
    #[error("{0} predictor is not initialized")]
    PredictorNotReady(Slot),

    /// Creating or initializing a predictor failed.
    #[error("{slot} predictor failed to initialize: {reason}")]
    PredictorInitializationFailed { slot: Slot, reason: String },

    /// An initialized predictor failed while serving a request.
    #[error("{slot} predictor failed: {source}")]
    Predictor {
        slot: Slot,
        #[source]
        source: PredictorError,
    },

    /// A response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(String),
}

impl SessionError {
    /// Whether this error ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ChannelBroken(_))
    }
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Malformed(detail) => Self::MalformedMessage(detail),
            ProtocolError::UnsupportedParameter(name) => Self::UnsupportedParameter(name),
            ProtocolError::Encode(err) => Self::Encode(err.to_string()),
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Timeout(after) => Self::ChannelTimeout(after),
            other => Self::ChannelBroken(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
