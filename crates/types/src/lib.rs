//! Shared type definitions for provider parameter panels.
//!
//! These types are consumed by the engine (resolution, validation, and
//! synchronization) and by front ends that render the generated panel. They
//! preserve declaration order (via `IndexMap`) so panels list fields in the
//! order a provider declares them.

pub mod parameter;
pub mod provider;
pub mod session;
pub mod value_set;

pub use parameter::{CatalogError, ParameterCatalog, ParameterKind, ParameterSpec, SelectItem, check_parameter_spec};
pub use provider::{ProviderDescriptor, ProviderSummary};
pub use session::SessionState;
pub use value_set::ValueSet;
