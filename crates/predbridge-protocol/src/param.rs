use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Runtime parameters a host may set. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Path,
    PathStatic,
    PathPersonalized,
    PathLog,
    EnableLogs,
    Suggestions,
    TestGenSentencePred,
    RetrieveAac,
    LogLevel,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 9] = [
        Self::Path,
        Self::PathStatic,
        Self::PathPersonalized,
        Self::PathLog,
        Self::EnableLogs,
        Self::Suggestions,
        Self::TestGenSentencePred,
        Self::RetrieveAac,
        Self::LogLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "PATH",
            Self::PathStatic => "PATH_STATIC",
            Self::PathPersonalized => "PATH_PERSONALIZED",
            Self::PathLog => "PATH_LOG",
            Self::EnableLogs => "ENABLE_LOGS",
            Self::Suggestions => "SUGGESTIONS",
            Self::TestGenSentencePred => "TEST_GEN_SENTENCE_PRED",
            Self::RetrieveAac => "RETRIEVE_AAC",
            Self::LogLevel => "LOG_LEVEL",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnsupportedParameter(s.to_string()))
    }
}

/// Decoded `SET_PARAM` payload. The value is kept as JSON; its type is
/// checked by whoever stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct SetParam {
    pub parameter: ParameterKind,
    pub value: Value,
}

impl SetParam {
    /// Decode `{"Parameter": <name>, "Value": <any>}`.
    pub fn from_payload(payload: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(payload)
            .map_err(|err| ProtocolError::Malformed(format!("SET_PARAM payload: {err}")))?;
        let Value::Object(mut fields) = document else {
            return Err(ProtocolError::Malformed(
                "SET_PARAM payload must be a JSON object".to_string(),
            ));
        };

        let parameter = match fields.get("Parameter") {
            Some(Value::String(name)) => name.parse::<ParameterKind>()?,
            Some(other) => return Err(ProtocolError::UnsupportedParameter(other.to_string())),
            None => {
                return Err(ProtocolError::Malformed(
                    "SET_PARAM payload is missing \"Parameter\"".to_string(),
                ))
            }
        };
        let value = fields.remove("Value").ok_or_else(|| {
            ProtocolError::Malformed("SET_PARAM payload is missing \"Value\"".to_string())
        })?;

        Ok(Self { parameter, value })
    }
}
