use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::message::{CommandKind, PredictionContextKind};

/// One ranked prediction: text and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Score")]
    pub score: f64,
}

impl Candidate {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Outcome flag of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failure,
}

/// Reply envelope sent back to the host for every handled message.
///
/// `command` is `None` only when the incoming text could not be decoded far
/// enough to know it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "MessageType")]
    pub command: Option<CommandKind>,
    #[serde(rename = "PredictionType", default)]
    pub context: PredictionContextKind,
    #[serde(rename = "Data", default)]
    pub payload: String,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Successful acknowledgement with an empty payload.
    pub fn ack(command: CommandKind, context: PredictionContextKind) -> Self {
        Self {
            command: Some(command),
            context,
            payload: String::new(),
            status: Status::Success,
            error: None,
        }
    }

    /// Successful reply carrying ranked candidates as a JSON array.
    pub fn with_candidates(
        command: CommandKind,
        context: PredictionContextKind,
        candidates: &[Candidate],
    ) -> Result<Self> {
        let payload = serde_json::to_string(candidates).map_err(ProtocolError::Encode)?;
        Ok(Self {
            payload,
            ..Self::ack(command, context)
        })
    }

    /// Failure-flagged reply.
    pub fn failure(
        command: Option<CommandKind>,
        context: PredictionContextKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            command,
            context,
            payload: String::new(),
            status: Status::Failure,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Decode the candidate list carried by a prediction reply.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        if self.payload.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.payload)
            .map_err(|err| ProtocolError::Malformed(format!("candidate list: {err}")))
    }
}
