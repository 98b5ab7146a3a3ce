//! Shared session state handle.
//!
//! Readers anywhere in the application take atomic snapshots. Only the sync
//! engine may replace the state, and it always replaces the whole object.

use std::sync::{Arc, PoisonError, RwLock};

use knobs_types::SessionState;

/// Cloneable handle to the shared session state.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Returns a consistent copy of the whole state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the whole state in one step.
    pub(crate) fn replace(&self, state: SessionState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knobs_types::ValueSet;
    use serde_json::json;

    #[test]
    fn clones_observe_replacements() {
        let handle = SessionHandle::new(SessionState::load("alpha", ValueSet::new()));
        let reader = handle.clone();

        let next = handle
            .snapshot()
            .with_current_values([("n", json!(2))].into_iter().collect());
        handle.replace(next.clone());

        assert_eq!(reader.snapshot(), next);
    }
}
