//! Live form state for the active provider's panel.
//!
//! The controller owns the editable values and the per-field validity derived
//! from the active [`ValidationSchema`]. Every mutation returns a
//! [`FormEvent`] carrying the full value snapshot; owners forward that message
//! instead of observing the controller.

use indexmap::IndexMap;
use knobs_types::{ParameterCatalog, ValueSet};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::schema::{FieldStatus, ValidationReport, ValidationSchema};

/// Message emitted after every value change.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// The full value set after the change.
    ValuesChanged(ValueSet),
}

/// Errors returned by form mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("parameter '{id}' is not part of the active panel")]
    UnknownField { id: String },
}

/// Editable values plus per-field validity for one provider.
#[derive(Debug, Clone, Default)]
pub struct FormController {
    field_ids: Vec<String>,
    values: ValueSet,
    schema: ValidationSchema,
    statuses: IndexMap<String, FieldStatus>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initializes the form for a new catalog.
    ///
    /// All previous values and statuses are discarded, then a full validation
    /// pass runs over the seed.
    pub fn seed(&mut self, catalog: &ParameterCatalog, schema: ValidationSchema, values: ValueSet) -> FormEvent {
        self.field_ids = catalog.ids().map(str::to_string).collect();
        self.values = values;
        self.schema = schema;
        self.statuses.clear();
        self.validate_all();
        FormEvent::ValuesChanged(self.values.clone())
    }

    /// Stores `value` for `id`.
    ///
    /// When `validate_immediately` is false the field is marked
    /// [`FieldStatus::Unvalidated`] until the next [`validate_all`](Self::validate_all).
    pub fn set_value(&mut self, id: &str, value: Value, validate_immediately: bool) -> Result<FormEvent, FormError> {
        self.ensure_field(id)?;
        self.values.insert(id, value);
        let status = if validate_immediately {
            self.schema.check_field(id, self.values.get(id))
        } else {
            FieldStatus::Unvalidated
        };
        trace!(parameter_id = %id, status = ?status, "form value updated");
        self.statuses.insert(id.to_string(), status);
        Ok(FormEvent::ValuesChanged(self.values.clone()))
    }

    /// Removes the value for `id`, leaving the field unset.
    pub fn clear_value(&mut self, id: &str) -> Result<FormEvent, FormError> {
        self.ensure_field(id)?;
        self.values.remove(id);
        self.statuses.insert(id.to_string(), FieldStatus::Valid);
        Ok(FormEvent::ValuesChanged(self.values.clone()))
    }

    /// Current snapshot of the form values.
    pub fn values(&self) -> &ValueSet {
        &self.values
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    /// Validity of `id`, or `None` when the field is not on the panel.
    pub fn status(&self, id: &str) -> Option<&FieldStatus> {
        self.statuses.get(id)
    }

    /// Field identifiers in panel order.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.field_ids.iter().map(String::as_str)
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// Runs a full validation pass, settling every deferred field.
    pub fn validate_all(&mut self) -> ValidationReport {
        let report = self.schema.validate(&self.values);
        for id in &self.field_ids {
            let status = report.status(id).cloned().unwrap_or(FieldStatus::Valid);
            self.statuses.insert(id.clone(), status);
        }
        report
    }

    /// True when no field is invalid or awaiting validation.
    pub fn is_submittable(&self) -> bool {
        !self
            .statuses
            .values()
            .any(|status| matches!(status, FieldStatus::Invalid(_) | FieldStatus::Unvalidated))
    }

    fn ensure_field(&self, id: &str) -> Result<(), FormError> {
        if self.field_ids.iter().any(|field_id| field_id == id) {
            Ok(())
        } else {
            Err(FormError::UnknownField { id: id.to_string() })
        }
    }
}
