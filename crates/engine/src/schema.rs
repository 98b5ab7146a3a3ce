//! Validation schema synthesized from a parameter catalog.
//!
//! Every recognized parameter kind maps to one [`FieldRule`]; kinds the build
//! does not recognize produce no rule and are therefore never blocked. Rules
//! are evaluated independently, so one failing field never hides the status of
//! another in the same pass.

use indexmap::IndexMap;
use knobs_types::{ParameterCatalog, ParameterKind, ParameterSpec, SelectItem, ValueSet};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Field-level validation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{parameter_id}: {reason}")]
pub struct FieldValidationError {
    pub parameter_id: String,
    pub reason: String,
}

impl FieldValidationError {
    pub fn new(parameter_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            parameter_id: parameter_id.into(),
            reason: reason.into(),
        }
    }
}

/// JSON type expected for the values of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Bool,
    /// Items mix types; any scalar or structured value passes.
    Any,
}

impl ValueType {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            _ => Self::Any,
        }
    }

    fn from_items(items: &[SelectItem]) -> Self {
        let mut types = items.iter().map(|item| Self::of(&item.value));
        match types.next() {
            Some(first) if types.all(|other| other == first) => first,
            _ => Self::Any,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            expected => Self::of(value) == expected,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "text",
            Self::Number => "a number",
            Self::Bool => "true or false",
            Self::Any => "any value",
        }
    }
}

/// Rule applied to the value of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Type guard only; membership is settled during resolution.
    Selection { element_type: ValueType },
    /// Number within the optional inclusive bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Ordered list of strings. Duplicates are allowed.
    TagList,
    Text,
    Toggle,
}

impl FieldRule {
    /// Derive the rule for `spec`, or `None` when its kind is not recognized.
    pub fn for_parameter(spec: &ParameterSpec) -> Option<Self> {
        match &spec.kind {
            ParameterKind::Selection { items } => Some(Self::Selection {
                element_type: ValueType::from_items(items),
            }),
            ParameterKind::NumericRange { min, max, .. } => Some(Self::Range { min: *min, max: *max }),
            ParameterKind::TagList => Some(Self::TagList),
            ParameterKind::Text { .. } => Some(Self::Text),
            ParameterKind::Toggle => Some(Self::Toggle),
            ParameterKind::Unknown => None,
        }
    }

    /// Check `value` for the parameter `parameter_id`.
    pub fn check(&self, parameter_id: &str, value: &Value) -> Result<(), FieldValidationError> {
        let fail = |reason: String| -> Result<(), FieldValidationError> { Err(FieldValidationError::new(parameter_id, reason)) };
        match self {
            Self::Selection { element_type } => {
                if element_type.accepts(value) {
                    Ok(())
                } else {
                    fail(format!("value must be {}", element_type.describe()))
                }
            }
            Self::Range { min, max } => {
                let Some(number) = value.as_f64() else {
                    return fail("value must be a number".to_string());
                };
                if let Some(min) = min
                    && number < *min
                {
                    return fail(format!("value must be at least {}", min));
                }
                if let Some(max) = max
                    && number > *max
                {
                    return fail(format!("value must be at most {}", max));
                }
                Ok(())
            }
            Self::TagList => match value {
                Value::Array(tags) if tags.iter().all(Value::is_string) => Ok(()),
                Value::Array(_) => fail("every tag must be text".to_string()),
                _ => fail("value must be a list of tags".to_string()),
            },
            Self::Text => {
                if value.is_string() {
                    Ok(())
                } else {
                    fail("value must be text".to_string())
                }
            }
            Self::Toggle => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    fail("value must be true or false".to_string())
                }
            }
        }
    }
}

/// Validity of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FieldStatus {
    Valid,
    Invalid(String),
    /// A value was written with validation deferred until the next full pass.
    Unvalidated,
}

impl FieldStatus {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// Per-field rules keyed by parameter id, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationSchema {
    rules: IndexMap<String, FieldRule>,
}

impl ValidationSchema {
    pub fn rule(&self, parameter_id: &str) -> Option<&FieldRule> {
        self.rules.get(parameter_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Status of one field holding `value`.
    ///
    /// Unset values and fields without a rule are always valid.
    pub fn check_field(&self, parameter_id: &str, value: Option<&Value>) -> FieldStatus {
        let (Some(rule), Some(value)) = (self.rules.get(parameter_id), value.filter(|value| !value.is_null())) else {
            return FieldStatus::Valid;
        };
        match rule.check(parameter_id, value) {
            Ok(()) => FieldStatus::Valid,
            Err(error) => FieldStatus::Invalid(error.reason),
        }
    }

    /// Validate every ruled field of `values` independently.
    pub fn validate(&self, values: &ValueSet) -> ValidationReport {
        let statuses = self
            .rules
            .keys()
            .map(|id| (id.clone(), self.check_field(id, values.get(id))))
            .collect();
        ValidationReport { statuses }
    }
}

/// Outcome of a full validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    statuses: IndexMap<String, FieldStatus>,
}

impl ValidationReport {
    pub fn status(&self, parameter_id: &str) -> Option<&FieldStatus> {
        self.statuses.get(parameter_id)
    }

    /// True when no field failed its rule.
    pub fn is_submittable(&self) -> bool {
        !self.statuses.values().any(FieldStatus::is_invalid)
    }

    /// Failures in catalog order.
    pub fn errors(&self) -> Vec<FieldValidationError> {
        self.statuses
            .iter()
            .filter_map(|(id, status)| match status {
                FieldStatus::Invalid(reason) => Some(FieldValidationError::new(id.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Build the composite validation schema for `catalog`.
pub fn build_schema(catalog: &ParameterCatalog) -> ValidationSchema {
    let mut rules = IndexMap::new();
    for spec in catalog {
        match FieldRule::for_parameter(spec) {
            Some(rule) => {
                rules.insert(spec.id.clone(), rule);
            }
            // Fail open: unrecognized kinds never block submission.
            None => debug!(parameter_id = %spec.id, kind = spec.kind.name(), "no validation rule for parameter kind"),
        }
    }
    ValidationSchema { rules }
}
