use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The verb of a message. Closed set; anything else is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    NextWordPrediction,
    NextSentencePrediction,
    LearnWords,
    LearnShorthand,
    LearnSentences,
    LearnCanned,
    SetParam,
    ForceQuit,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NextWordPrediction => "NEXT_WORD_PREDICTION",
            Self::NextSentencePrediction => "NEXT_SENTENCE_PREDICTION",
            Self::LearnWords => "LEARN_WORDS",
            Self::LearnShorthand => "LEARN_SHORTHAND",
            Self::LearnSentences => "LEARN_SENTENCES",
            Self::LearnCanned => "LEARN_CANNED",
            Self::SetParam => "SET_PARAM",
            Self::ForceQuit => "FORCE_QUIT",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which predictor a message is addressed to.
///
/// `None` strictly means "not addressed to a predictor".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionContextKind {
    #[default]
    None,
    Normal,
    Shorthand,
    Sentence,
    Canned,
}

impl PredictionContextKind {
    /// The predictor slot this context addresses, if any.
    pub fn slot(self) -> Option<Slot> {
        match self {
            Self::None => None,
            Self::Normal => Some(Slot::Word),
            Self::Shorthand => Some(Slot::Shorthand),
            Self::Sentence => Some(Slot::Sentence),
            Self::Canned => Some(Slot::Canned),
        }
    }
}

/// One of the four predictor slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Word,
    Shorthand,
    Sentence,
    Canned,
}

impl Slot {
    /// All slots, in reconfiguration order.
    pub const ALL: [Slot; 4] = [Slot::Word, Slot::Shorthand, Slot::Sentence, Slot::Canned];

    pub fn context(self) -> PredictionContextKind {
        match self {
            Self::Word => PredictionContextKind::Normal,
            Self::Shorthand => PredictionContextKind::Shorthand,
            Self::Sentence => PredictionContextKind::Sentence,
            Self::Canned => PredictionContextKind::Canned,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Shorthand => "shorthand",
            Self::Sentence => "sentence",
            Self::Canned => "canned",
        }
    }

    /// Stable position of the slot in [`Slot::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Word => 0,
            Self::Shorthand => 1,
            Self::Sentence => 2,
            Self::Canned => 3,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wire envelope: command, predictor context and an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "MessageType")]
    pub command: CommandKind,
    #[serde(rename = "PredictionType", default)]
    pub context: PredictionContextKind,
    #[serde(rename = "Data", default, deserialize_with = "payload_text")]
    pub payload: String,
}

impl Message {
    pub fn new(
        command: CommandKind,
        context: PredictionContextKind,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            command,
            context,
            payload: payload.into(),
        }
    }

    /// `SET_PARAM` message carrying `{"Parameter": .., "Value": ..}`.
    pub fn set_param(parameter: crate::param::ParameterKind, value: Value) -> Self {
        let payload = serde_json::json!({
            "Parameter": parameter.as_str(),
            "Value": value,
        });
        Self::new(
            CommandKind::SetParam,
            PredictionContextKind::None,
            payload.to_string(),
        )
    }

    /// `FORCE_QUIT` message.
    pub fn force_quit() -> Self {
        Self::new(CommandKind::ForceQuit, PredictionContextKind::None, "")
    }
}

/// `Data` is normally a string; hosts that inline the `SET_PARAM` document as
/// a JSON object get it back as its JSON text.
fn payload_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
