//! Structural checks applied to parameter declarations when a catalog is built.

use thiserror::Error;

use super::{ParameterKind, ParameterSpec};

/// Errors raised when a parameter declaration violates catalog invariants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate parameter id '{id}'")]
    DuplicateId { id: String },

    #[error("parameter id must not be empty")]
    EmptyId,

    #[error("selection parameter '{id}' declares no items")]
    EmptySelection { id: String },

    #[error("numeric range parameter '{id}' has min {min} greater than max {max}")]
    InvertedRange { id: String, min: f64, max: f64 },
}

/// Validate a single declaration against the per-kind invariants.
///
/// - Identifiers must be non-empty.
/// - Selections must offer at least one item.
/// - Numeric ranges must satisfy `min <= max` when both bounds are declared.
pub fn check_parameter_spec(spec: &ParameterSpec) -> Result<(), CatalogError> {
    if spec.id.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }

    match &spec.kind {
        ParameterKind::Selection { items } if items.is_empty() => Err(CatalogError::EmptySelection { id: spec.id.clone() }),
        ParameterKind::NumericRange {
            min: Some(min),
            max: Some(max),
            ..
        } if min > max => Err(CatalogError::InvertedRange {
            id: spec.id.clone(),
            min: *min,
            max: *max,
        }),
        _ => Ok(()),
    }
}
