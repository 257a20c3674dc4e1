use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::response::Response;

/// Serialize a message to one wire text unit.
pub fn encode_message(message: &Message) -> Result<String> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Parse one wire text unit into a message.
///
/// Any problem, including an unknown `MessageType`, is `Malformed`.
pub fn decode_message(text: &str) -> Result<Message> {
    serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))
}

/// Serialize a response to one wire text unit.
pub fn encode_response(response: &Response) -> Result<String> {
    serde_json::to_string(response).map_err(ProtocolError::Encode)
}

/// Parse one wire text unit into a response.
pub fn decode_response(text: &str) -> Result<Response> {
    serde_json::from_str(text).map_err(|err| ProtocolError::Malformed(err.to_string()))
}
