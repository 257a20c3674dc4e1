//! Bridge between an assistive-technology host and predictive-text engines.
//!
//! predbridge exchanges JSON commands and ranked predictions with a host over
//! a local pipe or a remote socket, and drives four predictor slots (word,
//! shorthand, sentence, canned phrase) on its behalf.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket and TCP streams
//! - [`frame`]: length-prefixed and newline framing
//! - [`channel`]: the duplex message channel and its two implementations
//! - [`protocol`]: wire envelope, requests and responses
//! - [`session`]: parameters, predictor registry, ranking and dispatch loop
//! - [`memory`]: an in-memory frequency predictor used by the CLI

/// Re-export transport types.
pub mod transport {
    pub use predbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use predbridge_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use predbridge_channel::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use predbridge_protocol::*;
}

/// Re-export session types.
pub mod session {
    pub use predbridge_session::*;
}

pub mod memory;
