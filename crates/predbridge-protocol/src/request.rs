use crate::error::{ProtocolError, Result};
use crate::message::{CommandKind, Message, Slot};
use crate::param::SetParam;

/// What kind of continuation a prediction request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionTarget {
    NextWord,
    NextSentence,
}

/// A message interpreted according to its command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    SetParam(SetParam),
    Predict {
        target: PredictionTarget,
        slot: Slot,
        text: String,
    },
    Learn {
        slot: Slot,
        text: String,
    },
    ForceQuit,
}

impl TryFrom<Message> for Request {
    type Error = ProtocolError;

    fn try_from(message: Message) -> Result<Self> {
        let learn = |slot| Request::Learn {
            slot,
            text: message.payload.clone(),
        };
        let request = match message.command {
            CommandKind::SetParam => Request::SetParam(SetParam::from_payload(&message.payload)?),
            CommandKind::NextWordPrediction | CommandKind::NextSentencePrediction => {
                let target = if message.command == CommandKind::NextWordPrediction {
                    PredictionTarget::NextWord
                } else {
                    PredictionTarget::NextSentence
                };
                let slot = message.context.slot().ok_or_else(|| {
                    ProtocolError::Malformed(format!(
                        "{} requires a prediction type other than NONE",
                        message.command
                    ))
                })?;
                Request::Predict {
                    target,
                    slot,
                    text: message.payload.clone(),
                }
            }
            CommandKind::LearnWords => learn(Slot::Word),
            CommandKind::LearnShorthand => learn(Slot::Shorthand),
            CommandKind::LearnSentences => learn(Slot::Sentence),
            CommandKind::LearnCanned => learn(Slot::Canned),
            CommandKind::ForceQuit => Request::ForceQuit,
        };
        Ok(request)
    }
}
