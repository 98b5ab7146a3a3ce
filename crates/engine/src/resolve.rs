//! # Settings Resolution
//!
//! Chooses the starting value of every declared parameter when a provider's
//! panel is seeded. Candidates come from a fixed priority chain:
//!
//! 1. the session's current values,
//! 2. the values captured when the session was loaded,
//! 3. the parameter's declared `initial` value.
//!
//! The first *defined* candidate from (1) or (2) is kept only when it is
//! compatible with the parameter; otherwise resolution falls back to the
//! declared `initial`, and the field starts unset when there is none.
//!
//! Compatibility is kind-specific. Selections accept only values offered by
//! their items, because a picker cannot display an option it does not have.
//! Every other kind accepts any defined value; range and type violations are
//! reported later by the validation schema, not silently replaced here.
//!
//! ## Usage
//!
//! ```rust
//! use knobs_engine::resolve::resolve_settings;
//! use knobs_types::{ParameterCatalog, ParameterKind, ParameterSpec, SelectItem, ValueSet};
//! use serde_json::json;
//!
//! let catalog = ParameterCatalog::new([
//!     ParameterSpec::new("model", ParameterKind::selection([SelectItem::new("A", json!("a"))])).with_initial(json!("a")),
//! ])?;
//! let original: ValueSet = [("model", json!("retired"))].into_iter().collect();
//!
//! let seeded = resolve_settings(&catalog, &ValueSet::new(), &original);
//! assert_eq!(seeded.get("model"), Some(&json!("a")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use knobs_types::{ParameterCatalog, ParameterKind, ParameterSpec, ValueSet};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Carried over from the session's current values.
    Current,
    /// Carried over from the values captured at session load.
    Original,
    /// Taken from the parameter's declared initial value.
    Initial,
    /// No value applied; the field starts unset.
    Unset,
}

/// Which candidate set an incompatible value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    Current,
    Original,
}

/// A carried-over value that failed the compatibility check and was dropped.
///
/// Never surfaced to the user; kept for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompatibleValue {
    pub parameter_id: String,
    pub candidate: Value,
    pub origin: CandidateOrigin,
}

/// Resolved values together with per-field provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    /// Values to seed the form with.
    pub values: ValueSet,
    /// Source of every catalog entry, in catalog order.
    pub sources: Vec<(String, ResolutionSource)>,
    /// Candidates that were discarded as incompatible.
    pub incompatible: Vec<IncompatibleValue>,
}

impl ResolutionReport {
    /// Returns the provenance recorded for `parameter_id`.
    pub fn source_of(&self, parameter_id: &str) -> Option<ResolutionSource> {
        self.sources
            .iter()
            .find(|(id, _)| id == parameter_id)
            .map(|(_, source)| *source)
    }
}

/// Resolve seed values for `catalog` from the current and original value sets.
///
/// The result contains only catalog ids, follows catalog order, and is a fresh
/// value set; neither input is modified. Identical inputs always produce
/// identical output.
pub fn resolve_settings(catalog: &ParameterCatalog, current: &ValueSet, original: &ValueSet) -> ValueSet {
    resolve_settings_with_report(catalog, current, original).values
}

/// Same as [`resolve_settings`] but also reports where each value came from.
pub fn resolve_settings_with_report(catalog: &ParameterCatalog, current: &ValueSet, original: &ValueSet) -> ResolutionReport {
    let mut report = ResolutionReport::default();

    for spec in catalog {
        let candidate = current
            .defined(&spec.id)
            .map(|value| (value, CandidateOrigin::Current))
            .or_else(|| original.defined(&spec.id).map(|value| (value, CandidateOrigin::Original)));

        let source = match candidate {
            Some((value, origin)) if is_compatible(spec, value) => {
                report.values.insert(spec.id.clone(), value.clone());
                match origin {
                    CandidateOrigin::Current => ResolutionSource::Current,
                    CandidateOrigin::Original => ResolutionSource::Original,
                }
            }
            candidate => {
                if let Some((value, origin)) = candidate {
                    debug!(
                        parameter_id = %spec.id,
                        candidate = %value,
                        origin = ?origin,
                        "discarding incompatible carried-over value"
                    );
                    report.incompatible.push(IncompatibleValue {
                        parameter_id: spec.id.clone(),
                        candidate: value.clone(),
                        origin,
                    });
                }
                match spec.initial_value() {
                    Some(initial) => {
                        report.values.insert(spec.id.clone(), initial.clone());
                        ResolutionSource::Initial
                    }
                    None => ResolutionSource::Unset,
                }
            }
        };
        report.sources.push((spec.id.clone(), source));
    }

    report
}

/// Returns true when `candidate` may be offered back to the widget for `spec`.
pub fn is_compatible(spec: &ParameterSpec, candidate: &Value) -> bool {
    match &spec.kind {
        ParameterKind::Selection { items } => items.iter().any(|item| item.matches(candidate)),
        ParameterKind::NumericRange { .. }
        | ParameterKind::TagList
        | ParameterKind::Text { .. }
        | ParameterKind::Toggle
        | ParameterKind::Unknown => !candidate.is_null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knobs_types::SelectItem;
    use serde_json::json;

    fn values(entries: &[(&str, Value)]) -> ValueSet {
        entries.iter().map(|(id, value)| (*id, value.clone())).collect()
    }

    fn model_selection() -> ParameterSpec {
        ParameterSpec::new(
            "model",
            ParameterKind::selection([SelectItem::new("A", json!("a")), SelectItem::new("B", json!("b"))]),
        )
        .with_initial(json!("a"))
    }

    fn playground_catalog() -> ParameterCatalog {
        ParameterCatalog::new([
            ParameterSpec::new("temperature", ParameterKind::numeric_range(Some(0.0), Some(2.0))).with_initial(json!(1)),
            model_selection(),
        ])
        .expect("valid catalog")
    }

    #[test]
    fn current_value_wins_over_original_and_initial() {
        let catalog = playground_catalog();

        let resolved = resolve_settings(
            &catalog,
            &values(&[("model", json!("b"))]),
            &values(&[("model", json!("a"))]),
        );

        assert_eq!(resolved.get("model"), Some(&json!("b")));
    }

    #[test]
    fn original_value_used_when_current_is_undefined() {
        let catalog = playground_catalog();

        let report = resolve_settings_with_report(&catalog, &ValueSet::new(), &values(&[("temperature", json!(0.3))]));

        assert_eq!(report.values.get("temperature"), Some(&json!(0.3)));
        assert_eq!(report.source_of("temperature"), Some(ResolutionSource::Original));
        assert_eq!(report.source_of("model"), Some(ResolutionSource::Initial));
    }

    #[test]
    fn null_current_value_is_treated_as_undefined() {
        let catalog = playground_catalog();

        let resolved = resolve_settings(
            &catalog,
            &values(&[("temperature", Value::Null)]),
            &values(&[("temperature", json!(1.5))]),
        );

        assert_eq!(resolved.get("temperature"), Some(&json!(1.5)));
    }

    #[test]
    fn stale_selection_falls_back_to_initial() {
        let catalog = playground_catalog();

        let report = resolve_settings_with_report(&catalog, &ValueSet::new(), &values(&[("model", json!("c"))]));

        assert_eq!(report.values.get("model"), Some(&json!("a")));
        assert_eq!(
            report.incompatible,
            vec![IncompatibleValue {
                parameter_id: "model".into(),
                candidate: json!("c"),
                origin: CandidateOrigin::Original,
            }]
        );
    }

    #[test]
    fn incompatible_current_does_not_fall_through_to_original() {
        let catalog = playground_catalog();

        let resolved = resolve_settings(
            &catalog,
            &values(&[("model", json!("retired"))]),
            &values(&[("model", json!("b"))]),
        );

        assert_eq!(resolved.get("model"), Some(&json!("a")));
    }

    #[test]
    fn stale_selection_without_initial_is_omitted() {
        let mut spec = model_selection();
        spec.initial = None;
        let catalog = ParameterCatalog::new([spec]).expect("valid catalog");

        let report = resolve_settings_with_report(&catalog, &values(&[("model", json!("z"))]), &ValueSet::new());

        assert!(!report.values.contains("model"));
        assert_eq!(report.source_of("model"), Some(ResolutionSource::Unset));
    }

    #[test]
    fn out_of_range_number_is_still_carried_over() {
        let catalog = playground_catalog();

        let resolved = resolve_settings(&catalog, &values(&[("temperature", json!(3))]), &values(&[("model", json!("c"))]));

        assert_eq!(resolved, values(&[("temperature", json!(3)), ("model", json!("a"))]));
    }

    #[test]
    fn unknown_ids_never_leak_into_result() {
        let catalog = playground_catalog();

        let resolved = resolve_settings(
            &catalog,
            &values(&[("onlyInA", json!("x")), ("temperature", json!(0.5))]),
            &values(&[("legacy", json!(true))]),
        );

        assert!(resolved.keys().all(|id| catalog.contains(id)));
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["temperature", "model"]);
    }

    #[test]
    fn resolution_is_deterministic_and_leaves_inputs_untouched() {
        let catalog = playground_catalog();
        let current = values(&[("temperature", json!(0.7)), ("model", json!("nope"))]);
        let original = values(&[("model", json!("b"))]);
        let current_before = current.clone();

        let first = resolve_settings_with_report(&catalog, &current, &original);
        let second = resolve_settings_with_report(&catalog, &current, &original);

        assert_eq!(first, second);
        assert_eq!(current, current_before);
    }

    fn mixed_catalogs() -> Vec<ParameterCatalog> {
        let bare_selection = ParameterSpec::new(
            "model",
            ParameterKind::selection([SelectItem::new("A", json!("a")), SelectItem::new("One", json!(1))]),
        );
        vec![
            ParameterCatalog::default(),
            playground_catalog(),
            ParameterCatalog::new([
                bare_selection.clone(),
                ParameterSpec::new("seed", ParameterKind::Unknown),
                ParameterSpec::new("stop", ParameterKind::TagList).with_initial(Value::Null),
            ])
            .expect("valid catalog"),
            ParameterCatalog::new([
                ParameterSpec::new("echo", ParameterKind::Toggle).with_initial(json!(false)),
                ParameterSpec::new("persona", ParameterKind::Text { multiline: true }),
                bare_selection,
                ParameterSpec::new("top_p", ParameterKind::numeric_range(None, Some(1.0))),
            ])
            .expect("valid catalog"),
        ]
    }

    fn mixed_candidates() -> Vec<(ValueSet, ValueSet)> {
        vec![
            (ValueSet::new(), ValueSet::new()),
            (
                values(&[("model", Value::Null), ("seed", json!({"k": 1})), ("legacy", json!(true))]),
                values(&[("model", json!(1.0)), ("stop", json!(["###"]))]),
            ),
            (
                values(&[("model", json!("gone")), ("temperature", Value::Null), ("top_p", json!(7))]),
                values(&[("temperature", json!(0.2)), ("echo", Value::Null), ("orphan", json!("x"))]),
            ),
        ]
    }

    #[test]
    fn resolution_never_leaks_keys_and_is_idempotent_across_catalogs() {
        for catalog in mixed_catalogs() {
            for (current, original) in mixed_candidates() {
                let first = resolve_settings_with_report(&catalog, &current, &original);
                let second = resolve_settings_with_report(&catalog, &current, &original);

                assert_eq!(first, second, "resolution must be deterministic for {:?}", catalog.ids().collect::<Vec<_>>());
                assert!(
                    first.values.keys().all(|id| catalog.contains(id)),
                    "leaked keys {:?} for catalog {:?}",
                    first.values.keys().collect::<Vec<_>>(),
                    catalog.ids().collect::<Vec<_>>()
                );
                assert!(first.values.iter().all(|(_, value)| !value.is_null()), "null resolved into {:?}", first.values);
                assert_eq!(first.sources.len(), catalog.len());
            }
        }
    }

    #[test]
    fn unknown_kind_accepts_any_defined_value() {
        let spec = ParameterSpec::new("seed", ParameterKind::Unknown);

        assert!(is_compatible(&spec, &json!({"anything": [1, 2]})));
        assert!(!is_compatible(&spec, &Value::Null));
    }
}
