//! # Session synchronization
//!
//! Keeps the settings form and the shared session state in step.
//!
//! Modules:
//! - `selector`: Known providers and default-provider fallback
//! - `engine`: The [`SyncEngine`] reacting to provider switches and field edits
//! - `loader`: Background catalog fetching that hands results back to the engine
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo(source: &dyn knobs_engine::catalog::CatalogSource) -> anyhow::Result<()> {
//! use knobs_engine::{session::SessionHandle, sync::{ProviderSelector, SyncEngine}};
//! use knobs_types::{SessionState, ValueSet};
//!
//! let session = SessionHandle::new(SessionState::load("chat", ValueSet::new()));
//! let selector = ProviderSelector::new(source.providers().await?, "chat")?;
//! let mut engine = SyncEngine::new(session.clone(), selector);
//! engine.switch_with(source).await;
//! engine.edit("temperature", serde_json::json!(0.7), true)?;
//! assert_eq!(session.snapshot().current_values(), engine.form().values());
//! # Ok(())
//! # }
//! ```

mod engine;
mod loader;
mod selector;

use knobs_types::ValueSet;
use serde::Serialize;
use thiserror::Error;

use crate::{catalog::CatalogSourceError, resolve::ResolutionReport};

pub use engine::SyncEngine;
pub use loader::{CatalogLoaded, CatalogLoader};
pub use selector::{ProviderSelector, ProviderSubstitution, SelectorError};

/// Identifies one provider switch. Only the most recent ticket is honored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchTicket {
    pub generation: u64,
    pub provider_id: String,
}

/// Notices for the host to render next to the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum PanelSignal {
    /// The panel was rebuilt for `provider_id` with `values`.
    Reseeded { provider_id: String, values: ValueSet },
    /// A catalog result arrived after a newer switch started.
    StaleResultDiscarded { provider_id: String },
    /// The active provider was unknown and the default provider took its place.
    ProviderSubstituted {
        missing: String,
        substitute: String,
        substitute_name: String,
    },
    /// The catalog could not be resolved; the previous panel stays.
    CatalogUnavailable { provider_id: String, reason: String },
}

/// A provider switch whose catalog could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not load settings for provider '{provider_id}': {source}")]
pub struct CatalogResolutionError {
    pub provider_id: String,
    #[source]
    pub source: CatalogSourceError,
}

/// Result of handing a catalog to [`SyncEngine::apply_catalog`].
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchOutcome {
    Applied { ticket: SwitchTicket, report: ResolutionReport },
    Stale { ticket: SwitchTicket },
    Failed { ticket: SwitchTicket, error: CatalogResolutionError },
}

impl SwitchOutcome {
    pub fn ticket(&self) -> &SwitchTicket {
        match self {
            Self::Applied { ticket, .. } | Self::Stale { ticket } | Self::Failed { ticket, .. } => ticket,
        }
    }

    /// Resolution report of an applied switch.
    pub fn report(&self) -> Option<&ResolutionReport> {
        match self {
            Self::Applied { report, .. } => Some(report),
            _ => None,
        }
    }
}
