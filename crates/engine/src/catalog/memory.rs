use async_trait::async_trait;
use indexmap::IndexMap;
use knobs_types::{ProviderDescriptor, ProviderSummary};

use super::{CatalogSource, CatalogSourceError};

/// Catalog source serving descriptors held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    descriptors: IndexMap<String, ProviderDescriptor>,
}

impl StaticCatalogSource {
    pub fn new(descriptors: impl IntoIterator<Item = ProviderDescriptor>) -> Self {
        Self {
            descriptors: descriptors
                .into_iter()
                .map(|descriptor| (descriptor.provider_id.clone(), descriptor))
                .collect(),
        }
    }

    /// Adds or replaces a descriptor.
    pub fn insert(&mut self, descriptor: ProviderDescriptor) {
        self.descriptors.insert(descriptor.provider_id.clone(), descriptor);
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch(&self, provider_id: &str) -> Result<ProviderDescriptor, CatalogSourceError> {
        self.descriptors
            .get(provider_id)
            .cloned()
            .ok_or_else(|| CatalogSourceError::not_found(provider_id))
    }

    async fn providers(&self) -> Result<Vec<ProviderSummary>, CatalogSourceError> {
        Ok(self.descriptors.values().map(ProviderDescriptor::summary).collect())
    }
}
