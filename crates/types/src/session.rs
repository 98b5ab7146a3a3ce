//! Shared session state consumed by the rest of the application.
//!
//! The state is replaced as a whole object; there are no setters for nested
//! fields. `original_values` is captured at load time and every derived state
//! carries it forward unchanged.

use serde::{Deserialize, Serialize};

use crate::value_set::ValueSet;

/// Snapshot of the active provider and its parameter values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    active_provider_id: String,
    #[serde(default)]
    current_values: ValueSet,
    #[serde(default)]
    original_values: ValueSet,
}

impl SessionState {
    /// Starts a session for `active_provider_id` with the values captured at load time.
    ///
    /// Current values start empty so the first resolution falls back to `original_values`.
    pub fn load(active_provider_id: impl Into<String>, original_values: ValueSet) -> Self {
        Self {
            active_provider_id: active_provider_id.into(),
            current_values: ValueSet::new(),
            original_values,
        }
    }

    pub fn active_provider_id(&self) -> &str {
        &self.active_provider_id
    }

    pub fn current_values(&self) -> &ValueSet {
        &self.current_values
    }

    pub fn original_values(&self) -> &ValueSet {
        &self.original_values
    }

    /// Returns a copy of this state pointing at a different provider.
    pub fn with_active_provider(&self, provider_id: impl Into<String>) -> Self {
        Self {
            active_provider_id: provider_id.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this state whose current values are replaced wholesale.
    pub fn with_current_values(&self, current_values: ValueSet) -> Self {
        Self {
            active_provider_id: self.active_provider_id.clone(),
            current_values,
            original_values: self.original_values.clone(),
        }
    }
}
