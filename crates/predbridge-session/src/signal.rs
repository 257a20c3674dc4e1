use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-level quit flag shared between the host-facing sessions and
/// whoever owns the process (CLI, Ctrl-C handler).
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
