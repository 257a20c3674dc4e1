use std::fmt;
use std::sync::Arc;

use predbridge_protocol::Slot;
use tracing::{debug, info, warn};

use crate::context::{ContextMode, ContextTracker};
use crate::error::{Result, SessionError};
use crate::params::ParameterStore;
use crate::predictor::{Prediction, Predictor, PredictorConfig, PredictorError, PredictorFactory};

/// Lifecycle state of one predictor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Uninitialized,
    Initialized,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
        })
    }
}

/// What a reconfiguration pass did to one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Created and initialized during this pass.
    Initialized,
    /// Already initialized; runtime flags and filters were refreshed.
    Updated,
    /// Creating or initializing the slot failed; it stays uninitialized.
    InitializationFailed(String),
    /// Refreshing an initialized slot failed; the instance is kept.
    RefreshFailed(String),
}

/// Per-slot outcomes of one reconfiguration pass, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconfigureReport {
    pub outcomes: Vec<(Slot, SlotOutcome)>,
}

impl ReconfigureReport {
    pub fn failures(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.outcomes.iter().filter_map(|(slot, outcome)| match outcome {
            SlotOutcome::InitializationFailed(reason) | SlotOutcome::RefreshFailed(reason) => {
                Some((*slot, reason.as_str()))
            }
            _ => None,
        })
    }

    /// Failed slots as session errors, in slot order.
    pub fn errors(&self) -> Vec<SessionError> {
        self.outcomes
            .iter()
            .filter_map(|(slot, outcome)| match outcome {
                SlotOutcome::InitializationFailed(reason) => {
                    Some(SessionError::PredictorInitializationFailed {
                        slot: *slot,
                        reason: reason.clone(),
                    })
                }
                SlotOutcome::RefreshFailed(reason) => Some(SessionError::Predictor {
                    slot: *slot,
                    source: PredictorError::Failed(reason.clone()),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome(&self, slot: Slot) -> Option<&SlotOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, outcome)| outcome)
    }
}

struct SlotEntry {
    predictor: Option<Box<dyn Predictor>>,
    context: ContextTracker,
}

/// The four predictor slots of a session.
///
/// A slot holds an instance only once it is initialized. Instances are never
/// initialized twice: later passes only refresh them.
pub struct PredictorRegistry {
    factory: Arc<dyn PredictorFactory>,
    slots: [SlotEntry; 4],
}

impl PredictorRegistry {
    pub fn new(factory: Arc<dyn PredictorFactory>) -> Self {
        let entry = |slot| SlotEntry {
            predictor: None,
            context: ContextTracker::new(ContextMode::for_slot(slot)),
        };
        Self {
            factory,
            slots: Slot::ALL.map(entry),
        }
    }

    pub fn state(&self, slot: Slot) -> SlotState {
        if self.slots[slot.index()].predictor.is_some() {
            SlotState::Initialized
        } else {
            SlotState::Uninitialized
        }
    }

    /// Bring every slot in line with `store`, in slot order.
    pub fn reconfigure(&mut self, store: &ParameterStore) -> ReconfigureReport {
        let mut report = ReconfigureReport::default();
        for slot in Slot::ALL {
            let outcome = match self.state(slot) {
                SlotState::Uninitialized => self.cold_start(slot, store),
                SlotState::Initialized => self.refresh(slot, store),
            };
            match &outcome {
                SlotOutcome::InitializationFailed(reason) => {
                    warn!(%slot, %reason, "predictor initialization failed")
                }
                SlotOutcome::RefreshFailed(reason) => {
                    warn!(%slot, %reason, "predictor refresh failed")
                }
                other => debug!(%slot, outcome = ?other, "predictor reconfigured"),
            }
            report.outcomes.push((slot, outcome));
        }
        report
    }

    /// Drop the instance in `slot`; the next pass creates a fresh one.
    pub fn recreate(&mut self, slot: Slot) {
        let entry = &mut self.slots[slot.index()];
        if entry.predictor.take().is_some() {
            info!(%slot, "predictor scheduled for re-creation");
        }
        entry.context.clear();
    }

    /// Feed `text` into the slot's context and ask its predictor.
    pub fn predict(&mut self, slot: Slot, text: &str) -> Result<Prediction> {
        let entry = &mut self.slots[slot.index()];
        let predictor = entry
            .predictor
            .as_mut()
            .ok_or(SessionError::PredictorNotReady(slot))?;
        entry.context.update(text);
        predictor
            .predict(&entry.context)
            .map_err(|source| SessionError::Predictor { slot, source })
    }

    pub fn learn(&mut self, slot: Slot, text: &str) -> Result<()> {
        let predictor = self.slots[slot.index()]
            .predictor
            .as_mut()
            .ok_or(SessionError::PredictorNotReady(slot))?;
        predictor
            .learn(text)
            .map_err(|source| SessionError::Predictor { slot, source })
    }

    pub fn context(&self, slot: Slot) -> &ContextTracker {
        &self.slots[slot.index()].context
    }

    fn cold_start(&mut self, slot: Slot, store: &ParameterStore) -> SlotOutcome {
        let config = PredictorConfig::from_store(slot, store);
        match self.build(slot, &config) {
            Ok(predictor) => {
                self.slots[slot.index()].predictor = Some(predictor);
                info!(%slot, "predictor initialized");
                SlotOutcome::Initialized
            }
            Err(err) => SlotOutcome::InitializationFailed(err.to_string()),
        }
    }

    fn build(
        &self,
        slot: Slot,
        config: &PredictorConfig,
    ) -> std::result::Result<Box<dyn Predictor>, PredictorError> {
        let mut predictor = self.factory.create(slot, config)?;
        predictor.initialize(config)?;
        if matches!(slot, Slot::Sentence | Slot::Canned) {
            predictor.read_updated_toxic_words()?;
        }
        if slot == Slot::Canned {
            predictor.recreate_db()?;
        }
        Ok(predictor)
    }

    fn refresh(&mut self, slot: Slot, store: &ParameterStore) -> SlotOutcome {
        let Some(predictor) = self.slots[slot.index()].predictor.as_mut() else {
            return SlotOutcome::RefreshFailed("predictor is not initialized".to_string());
        };
        let refreshed = predictor
            .update_params(store.test_gen_sentence_pred(), store.retrieve_aac())
            .and_then(|()| predictor.read_updated_toxic_words());
        match refreshed {
            Ok(()) => SlotOutcome::Updated,
            Err(err) => SlotOutcome::RefreshFailed(err.to_string()),
        }
    }
}
