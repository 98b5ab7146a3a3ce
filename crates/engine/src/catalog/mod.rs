//! Provider catalog sources.
//!
//! Modules:
//! - `memory`: In-memory source for tests and embedding hosts
//! - `directory`: Source backed by descriptor files on disk
//!
//! The catalog source is the only asynchronous collaborator of the engine.
//! Fetches may fail; callers turn failures into panel warnings rather than
//! propagating them.

mod directory;
mod memory;

use async_trait::async_trait;
use knobs_types::{ProviderDescriptor, ProviderSummary};
use thiserror::Error;

pub use directory::DirectoryCatalogSource;
pub use memory::StaticCatalogSource;

/// Failures reported by a [`CatalogSource`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogSourceError {
    #[error("provider '{provider_id}' is not known to the catalog source")]
    NotFound { provider_id: String },

    #[error("catalog for provider '{provider_id}' is unavailable: {reason}")]
    Unavailable { provider_id: String, reason: String },

    #[error("catalog for provider '{provider_id}' is malformed: {reason}")]
    Malformed { provider_id: String, reason: String },
}

impl CatalogSourceError {
    pub fn not_found(provider_id: impl Into<String>) -> Self {
        Self::NotFound {
            provider_id: provider_id.into(),
        }
    }

    pub fn unavailable(provider_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            provider_id: provider_id.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(provider_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            provider_id: provider_id.into(),
            reason: reason.into(),
        }
    }
}

/// Supplies provider descriptors on request.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the descriptor (including its parameter catalog) for `provider_id`.
    async fn fetch(&self, provider_id: &str) -> Result<ProviderDescriptor, CatalogSourceError>;

    /// List every provider this source can describe.
    async fn providers(&self) -> Result<Vec<ProviderSummary>, CatalogSourceError>;
}
