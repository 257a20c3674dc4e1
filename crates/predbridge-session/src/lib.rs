//! Session layer of predbridge: everything between a connected channel and
//! the predictive engines.
//!
//! - [`ParameterStore`]: validated runtime parameters
//! - [`PredictorRegistry`]: four predictor slots and their lifecycle
//! - [`rank`]: deterministic top-N ordering of candidates
//! - [`Dispatcher`]: the receive → handle → respond loop
//!
//! A [`Session`] bundles one store and one registry. Sessions never share
//! state; a server handling several hosts creates one per connection.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod predictor;
pub mod rank;
pub mod registry;
pub mod signal;

pub use context::{ContextMode, ContextTracker};
pub use dispatch::{Dispatcher, LogControl, Reply, Session, SessionEnd};
pub use error::{Result, SessionError};
pub use params::{LogLevel, ParamError, ParameterStore};
pub use predictor::{Prediction, Predictor, PredictorConfig, PredictorError, PredictorFactory};
pub use rank::rank;
pub use registry::{PredictorRegistry, ReconfigureReport, SlotOutcome, SlotState};
pub use signal::ShutdownSignal;
