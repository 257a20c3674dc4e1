//! Wire protocol spoken between an assistive-technology host and predbridge.
//!
//! Every exchange is one JSON envelope:
//!
//! ```text
//! {"MessageType": "NEXT_WORD_PREDICTION", "PredictionType": "NORMAL", "Data": "how are y"}
//! ```
//!
//! `Data` is opaque at the envelope level. [`Request`] gives it meaning per
//! command: free text for predictions and learning, a nested
//! `{"Parameter": .., "Value": ..}` document for `SET_PARAM`.
//! Replies use [`Response`], which echoes the command and adds a status.

pub mod codec;
pub mod error;
pub mod message;
pub mod param;
pub mod request;
pub mod response;

pub use codec::{decode_message, decode_response, encode_message, encode_response};
pub use error::{ProtocolError, Result};
pub use message::{CommandKind, Message, PredictionContextKind, Slot};
pub use param::{ParameterKind, SetParam};
pub use request::{PredictionTarget, Request};
pub use response::{Candidate, Response, Status};
