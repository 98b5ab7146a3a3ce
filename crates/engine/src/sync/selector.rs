//! Provider picker backing the panel's provider dropdown.

use indexmap::IndexMap;
use knobs_types::ProviderSummary;
use thiserror::Error;
use tracing::{info, warn};

use crate::session::SessionHandle;

/// Errors raised by [`ProviderSelector`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("provider '{id}' is not in the list of known providers")]
    UnknownProvider { id: String },

    #[error("default provider '{id}' is not in the list of known providers")]
    UnknownDefault { id: String },
}

/// Known providers plus the designated fallback provider.
///
/// Hosts select providers through [`super::SyncEngine::select_provider`]; the
/// selector itself only writes on the engine's behalf.
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    providers: IndexMap<String, ProviderSummary>,
    default_provider_id: String,
}

impl ProviderSelector {
    pub fn new(
        providers: impl IntoIterator<Item = ProviderSummary>,
        default_provider_id: impl Into<String>,
    ) -> Result<Self, SelectorError> {
        let providers: IndexMap<String, ProviderSummary> = providers
            .into_iter()
            .map(|summary| (summary.provider_id.clone(), summary))
            .collect();
        let default_provider_id = default_provider_id.into();
        if !providers.contains_key(&default_provider_id) {
            return Err(SelectorError::UnknownDefault { id: default_provider_id });
        }
        Ok(Self {
            providers,
            default_provider_id,
        })
    }

    /// Known providers in listing order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderSummary> {
        self.providers.values()
    }

    pub fn find(&self, provider_id: &str) -> Option<&ProviderSummary> {
        self.providers.get(provider_id)
    }

    pub fn is_known(&self, provider_id: &str) -> bool {
        self.providers.contains_key(provider_id)
    }

    pub fn default_provider_id(&self) -> &str {
        &self.default_provider_id
    }

    /// Writes `provider_id` as the session's active provider.
    ///
    /// Returns `Ok(true)` when the active provider changed.
    pub(crate) fn select(&self, session: &SessionHandle, provider_id: &str) -> Result<bool, SelectorError> {
        if !self.is_known(provider_id) {
            return Err(SelectorError::UnknownProvider { id: provider_id.to_string() });
        }
        let snapshot = session.snapshot();
        if snapshot.active_provider_id() == provider_id {
            return Ok(false);
        }
        info!(from = %snapshot.active_provider_id(), to = %provider_id, "provider selected");
        session.replace(snapshot.with_active_provider(provider_id));
        Ok(true)
    }

    /// Replaces an unknown active provider with the default one.
    ///
    /// Returns the substitution performed, or `None` when the active provider is known.
    pub(crate) fn substitute_unknown(&self, session: &SessionHandle) -> Option<ProviderSubstitution> {
        let snapshot = session.snapshot();
        if self.is_known(snapshot.active_provider_id()) {
            return None;
        }
        let substitute = self.providers.get(&self.default_provider_id)?.clone();
        warn!(
            missing = %snapshot.active_provider_id(),
            substitute = %substitute.provider_id,
            "active provider is unknown; falling back to default provider"
        );
        let missing = snapshot.active_provider_id().to_string();
        session.replace(snapshot.with_active_provider(substitute.provider_id.clone()));
        Some(ProviderSubstitution { missing, substitute })
    }
}

/// Record of a fallback from an unknown provider to the default one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubstitution {
    pub missing: String,
    pub substitute: ProviderSummary,
}
