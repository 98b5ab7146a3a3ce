//! Strongly typed provider parameter declarations.
//!
//! A provider declares the knobs it exposes as an ordered [`ParameterCatalog`].
//! Each [`ParameterSpec`] carries a tagged [`ParameterKind`] so consumers can
//! switch exhaustively on the kind instead of probing for optional properties.
//! Catalogs preserve declaration order so panels render fields predictably.

mod validation;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use validation::{CatalogError, check_parameter_spec};

/// Declaration of a single configurable provider parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    /// Identifier unique within the owning catalog (for example, `temperature`).
    pub id: String,
    /// Optional human-readable label rendered next to the input widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional descriptive copy shown as a tooltip or help line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind of input together with its kind-specific constraints.
    #[serde(flatten)]
    pub kind: ParameterKind,
    /// Default value used when no carried-over value applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<JsonValue>,
}

impl ParameterSpec {
    /// Creates a parameter with no label, description, or initial value.
    pub fn new(id: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
            kind,
            initial: None,
        }
    }

    /// Sets the initial value.
    pub fn with_initial(mut self, initial: JsonValue) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label when present, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Returns the declared initial value, treating JSON `null` as absent.
    pub fn initial_value(&self) -> Option<&JsonValue> {
        self.initial.as_ref().filter(|value| !value.is_null())
    }
}

/// Kinds of provider parameters and the constraints each kind carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterKind {
    /// Pick exactly one value from a fixed list of options.
    Selection {
        /// Allowed options in display order.
        #[serde(default)]
        items: Vec<SelectItem>,
    },
    /// Numeric slider with optional inclusive bounds.
    NumericRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        /// Slider increment; display metadata only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    /// Free-form ordered list of string tags.
    TagList,
    /// Free text input.
    Text {
        #[serde(default)]
        multiline: bool,
    },
    /// Boolean switch.
    Toggle,
    /// Any kind this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl ParameterKind {
    /// Convenience constructor for a selection over the provided items.
    pub fn selection(items: impl IntoIterator<Item = SelectItem>) -> Self {
        Self::Selection {
            items: items.into_iter().collect(),
        }
    }

    /// Convenience constructor for a bounded numeric range without a step.
    pub fn numeric_range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::NumericRange { min, max, step: None }
    }

    /// Canonical wire name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Selection { .. } => "selection",
            Self::NumericRange { .. } => "numeric_range",
            Self::TagList => "tag_list",
            Self::Text { .. } => "text",
            Self::Toggle => "toggle",
            Self::Unknown => "unknown",
        }
    }
}

/// One option of a selection parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectItem {
    /// Text displayed in the picker. Defaults to the rendered value.
    #[serde(default)]
    pub label: String,
    /// Value stored when the option is chosen.
    pub value: JsonValue,
}

impl SelectItem {
    pub fn new(label: impl Into<String>, value: JsonValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Returns true when `candidate` denotes the same value as this option.
    ///
    /// Numbers compare by magnitude so `1` and `1.0` match; every other value
    /// compares structurally.
    pub fn matches(&self, candidate: &JsonValue) -> bool {
        match (&self.value, candidate) {
            (JsonValue::Number(expected), JsonValue::Number(actual)) => match (expected.as_f64(), actual.as_f64()) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => expected == actual,
            },
            (expected, actual) => expected == actual,
        }
    }
}

/// Ordered, id-unique sequence of parameter declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<ParameterSpec>", into = "Vec<ParameterSpec>")]
pub struct ParameterCatalog {
    parameters: IndexMap<String, ParameterSpec>,
}

impl ParameterCatalog {
    /// Builds a catalog, enforcing id uniqueness and per-kind invariants.
    pub fn new(parameters: impl IntoIterator<Item = ParameterSpec>) -> Result<Self, CatalogError> {
        let mut by_id = IndexMap::new();
        for spec in parameters {
            check_parameter_spec(&spec)?;
            if by_id.contains_key(&spec.id) {
                return Err(CatalogError::DuplicateId { id: spec.id });
            }
            by_id.insert(spec.id.clone(), spec);
        }
        Ok(Self { parameters: by_id })
    }

    /// Returns the declaration for `id`, if the catalog has one.
    pub fn get(&self, id: &str) -> Option<&ParameterSpec> {
        self.parameters.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parameters.contains_key(id)
    }

    /// Iterates declarations in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.values()
    }

    /// Iterates parameter identifiers in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl TryFrom<Vec<ParameterSpec>> for ParameterCatalog {
    type Error = CatalogError;

    fn try_from(parameters: Vec<ParameterSpec>) -> Result<Self, Self::Error> {
        Self::new(parameters)
    }
}

impl From<ParameterCatalog> for Vec<ParameterSpec> {
    fn from(catalog: ParameterCatalog) -> Self {
        catalog.parameters.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a ParameterCatalog {
    type Item = &'a ParameterSpec;
    type IntoIter = indexmap::map::Values<'a, String, ParameterSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.values()
    }
}
