//! # Knobs Engine
//!
//! The Knobs Engine reconciles a chat session's stored generation settings
//! with whatever parameters the active provider declares, validates edits
//! against per-field rules, and keeps the settings form and the shared
//! session state consistent while providers change underneath them.
//!
//! ## Key Features
//!
//! - **Settings Resolution**: Seeds each declared parameter from the session's current values, the
//!   values captured at load time, or the parameter's `initial`, discarding incompatible selections
//! - **Validation Schema**: Derives one rule per parameter kind and reports per-field errors
//! - **Form Controller**: Holds live values and field statuses; every change emits a full snapshot
//! - **Session Sync**: Applies provider switches with last-switch-wins semantics and mirrors edits
//!   into the session as whole-set replacements
//!
//! ## Usage
//!
//! ```rust
//! use knobs_engine::{build_schema, resolve_settings, FormController};
//! use knobs_types::{ParameterCatalog, ParameterKind, ParameterSpec, ValueSet};
//! use serde_json::json;
//!
//! let catalog = ParameterCatalog::new([
//!     ParameterSpec::new("temperature", ParameterKind::numeric_range(Some(0.0), Some(2.0))).with_initial(json!(1)),
//! ])?;
//! let seeded = resolve_settings(&catalog, &ValueSet::new(), &ValueSet::new());
//!
//! let mut form = FormController::new();
//! form.seed(&catalog, build_schema(&catalog), seeded);
//! form.set_value("temperature", json!(3), true)?;
//! assert!(!form.is_submittable());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: Candidate selection and compatibility checks
//! - **`schema`**: Field rules and validation reports
//! - **`form`**: Live form state
//! - **`session`**: Shared, snapshot-readable session handle
//! - **`catalog`**: Asynchronous sources of provider descriptors
//! - **`sync`**: Provider selection, switch tickets, and the sync engine

pub mod catalog;
pub mod form;
pub mod resolve;
pub mod schema;
pub mod session;
pub mod sync;

pub use catalog::{CatalogSource, CatalogSourceError, DirectoryCatalogSource, StaticCatalogSource};
pub use form::{FormController, FormError, FormEvent};
pub use resolve::{ResolutionReport, ResolutionSource, resolve_settings, resolve_settings_with_report};
pub use schema::{FieldRule, FieldStatus, FieldValidationError, ValidationReport, ValidationSchema, build_schema};
pub use session::SessionHandle;
pub use sync::{
    CatalogLoaded, CatalogLoader, CatalogResolutionError, PanelSignal, ProviderSelector, SelectorError, SwitchOutcome, SwitchTicket,
    SyncEngine,
};
