//! Provider descriptors supplied by the external catalog source.

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterCatalog;

/// A named backend together with its declared parameter catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderDescriptor {
    /// Canonical identifier stored in session state (for example, `openai-chat`).
    pub provider_id: String,
    /// Human-readable name for pickers and notices.
    pub display_name: String,
    /// Whether the provider speaks a chat-message protocol rather than plain completion.
    #[serde(default)]
    pub is_chat_oriented: bool,
    /// Parameters the provider accepts, in display order.
    #[serde(default)]
    pub parameters: ParameterCatalog,
}

impl ProviderDescriptor {
    /// Returns the lightweight summary used in provider pickers.
    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            provider_id: self.provider_id.clone(),
            display_name: self.display_name.clone(),
            is_chat_oriented: self.is_chat_oriented,
        }
    }
}

/// Entry in the list of known providers, without the parameter catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProviderSummary {
    pub provider_id: String,
    pub display_name: String,
    #[serde(default)]
    pub is_chat_oriented: bool,
}

impl ProviderSummary {
    pub fn new(provider_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            display_name: display_name.into(),
            is_chat_oriented: false,
        }
    }
}
