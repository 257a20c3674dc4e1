//! The narrow contract between the bridge and a predictive engine.
//!
//! The registry owns every [`Predictor`] and is the only caller. Engines are
//! built through a [`PredictorFactory`] so the registry can create them lazily
//! during a reconfiguration pass.

use std::path::PathBuf;

use predbridge_protocol::{Candidate, Slot};

use crate::context::ContextTracker;
use crate::params::ParameterStore;

/// Everything an engine needs to initialize, taken from the parameter store.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub slot: Slot,
    pub path: Option<PathBuf>,
    pub path_static: Option<PathBuf>,
    pub path_personalized: Option<PathBuf>,
    pub general_sentence_prediction: bool,
    pub retrieve_aac: bool,
}

impl PredictorConfig {
    pub fn from_store(slot: Slot, store: &ParameterStore) -> Self {
        Self {
            slot,
            path: store.path().map(Into::into),
            path_static: store.path_static().map(Into::into),
            path_personalized: store.path_personalized().map(Into::into),
            general_sentence_prediction: store.test_gen_sentence_pred(),
            retrieve_aac: store.retrieve_aac(),
        }
    }
}

/// Raw candidates produced by one `predict` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    pub words: Vec<Candidate>,
    pub sentences: Vec<Candidate>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

pub trait Predictor: Send {
    /// Load models and resources. Called once per instance.
    fn initialize(&mut self, config: &PredictorConfig) -> Result<(), PredictorError>;

    /// Apply changed runtime flags to an initialized engine.
    fn update_params(
        &mut self,
        general_sentence_prediction: bool,
        retrieve_aac: bool,
    ) -> Result<(), PredictorError>;

    /// Reload the list of words the engine must never suggest.
    fn read_updated_toxic_words(&mut self) -> Result<(), PredictorError>;

    fn predict(&mut self, context: &ContextTracker) -> Result<Prediction, PredictorError>;

    /// Feed user-produced text back into the engine.
    fn learn(&mut self, text: &str) -> Result<(), PredictorError>;

    /// Rebuild the engine's phrase database. Only canned-phrase engines keep one.
    fn recreate_db(&mut self) -> Result<(), PredictorError> {
        Ok(())
    }
}

pub trait PredictorFactory: Send + Sync {
    fn create(
        &self,
        slot: Slot,
        config: &PredictorConfig,
    ) -> Result<Box<dyn Predictor>, PredictorError>;
}
