use std::{path::PathBuf, sync::Arc};

use knobs_engine::{
    CatalogLoader, DirectoryCatalogSource, FieldStatus, PanelSignal, ProviderSelector, ResolutionSource, SessionHandle,
    SwitchOutcome, SyncEngine, build_schema, resolve_settings, resolve_settings_with_report,
};
use knobs_types::{ParameterCatalog, ParameterKind, ParameterSpec, SelectItem, SessionState, ValueSet};
use serde_json::json;

fn providers_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/providers")
}

async fn engine_for(active: &str, original: ValueSet) -> (SyncEngine, DirectoryCatalogSource) {
    let source = DirectoryCatalogSource::new(providers_dir());
    let providers = knobs_engine::CatalogSource::providers(&source).await.expect("list fixture providers");
    let selector = ProviderSelector::new(providers, "chat").expect("chat is a fixture provider");
    let session = SessionHandle::new(SessionState::load(active, original));
    (SyncEngine::new(session, selector), source)
}

fn scenario_catalog() -> ParameterCatalog {
    ParameterCatalog::new([
        ParameterSpec::new("temperature", ParameterKind::numeric_range(Some(0.0), Some(2.0))).with_initial(json!(1)),
        ParameterSpec::new(
            "model",
            ParameterKind::selection([SelectItem::new("A", json!("a")), SelectItem::new("B", json!("b"))]),
        )
        .with_initial(json!("a")),
    ])
    .expect("valid catalog")
}

#[test]
fn resolution_and_validation_are_separate_passes() {
    let catalog = scenario_catalog();
    let current: ValueSet = [("temperature", json!(3))].into_iter().collect();
    let original: ValueSet = [("model", json!("c"))].into_iter().collect();

    let report = resolve_settings_with_report(&catalog, &current, &original);
    let expected: ValueSet = [("temperature", json!(3)), ("model", json!("a"))].into_iter().collect();
    assert_eq!(report.values, expected);
    assert_eq!(report.source_of("model"), Some(ResolutionSource::Initial));

    let validation = build_schema(&catalog).validate(&report.values);
    assert!(!validation.is_submittable());
    let errors = validation.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].parameter_id, "temperature");
}

#[tokio::test]
async fn resolution_never_leaks_foreign_keys_and_is_idempotent() {
    let source = DirectoryCatalogSource::new(providers_dir());
    let mut catalogs = vec![scenario_catalog()];
    for provider_id in ["chat", "completion"] {
        let descriptor = knobs_engine::CatalogSource::fetch(&source, provider_id).await.expect("fixture descriptor");
        catalogs.push(descriptor.parameters);
    }
    let candidates: Vec<(ValueSet, ValueSet)> = vec![
        (
            [("temperature", json!(0.4)), ("top_k", json!(40))].into_iter().collect(),
            [("model", json!("b")), ("frequency_penalty", json!(1))].into_iter().collect(),
        ),
        (
            [("model", serde_json::Value::Null), ("logit_bias", json!({"1": 2})), ("persona", serde_json::Value::Null)]
                .into_iter()
                .collect(),
            [("model", json!("large")), ("stop", json!(["###"])), ("echo", serde_json::Value::Null)].into_iter().collect(),
        ),
        (ValueSet::new(), [("onlyInA", json!("x"))].into_iter().collect()),
    ];

    for catalog in &catalogs {
        for (current, original) in &candidates {
            let first = resolve_settings(catalog, current, original);
            let second = resolve_settings(catalog, current, original);

            assert_eq!(first, second, "resolution must be idempotent");
            assert!(
                first.keys().all(|id| catalog.contains(id)),
                "leaked keys: {:?}",
                first.keys().collect::<Vec<_>>()
            );
        }
    }

    let scenario = resolve_settings(&catalogs[0], &candidates[0].0, &candidates[0].1);
    assert_eq!(scenario.get("temperature"), Some(&json!(0.4)));
    assert_eq!(scenario.get("model"), Some(&json!("b")));
}

#[tokio::test]
async fn switching_providers_carries_shared_values_and_drops_the_rest() {
    let original: ValueSet = [("model", json!("large")), ("stop", json!(["###"]))].into_iter().collect();
    let (mut engine, source) = engine_for("chat", original).await;

    let outcome = engine.switch_with(&source).await;
    assert!(matches!(outcome, SwitchOutcome::Applied { .. }), "unexpected outcome: {:?}", outcome);
    assert_eq!(engine.form().value("model"), Some(&json!("large")));
    assert_eq!(engine.form().value("temperature"), Some(&json!(1)));

    engine.edit("temperature", json!(0.8), true).expect("edit temperature");
    engine.edit("persona", json!("terse"), true).expect("edit persona");

    let ticket = engine
        .select_provider("completion")
        .expect("completion is known")
        .expect("provider changed");
    let result = knobs_engine::CatalogSource::fetch(&source, &ticket.provider_id).await;
    let outcome = engine.apply_catalog(ticket, result);

    let report = outcome.report().expect("switch applied");
    assert_eq!(report.source_of("temperature"), Some(ResolutionSource::Current));
    assert_eq!(report.source_of("model"), Some(ResolutionSource::Initial));
    let expected: ValueSet = [("temperature", json!(0.8)), ("model", json!("base")), ("echo", json!(false))]
        .into_iter()
        .collect();
    assert_eq!(engine.form().values(), &expected);

    let session = engine.session().snapshot();
    assert_eq!(session.active_provider_id(), "completion");
    assert_eq!(session.current_values(), engine.form().values());
    assert!(!session.current_values().contains("persona"));
    assert_eq!(session.original_values().get("model"), Some(&json!("large")));
}

#[tokio::test]
async fn unrecognized_kinds_never_block_submission() {
    let (mut engine, source) = engine_for("completion", ValueSet::new()).await;

    engine.switch_with(&source).await;

    assert!(engine.form().schema().rule("logit_bias").is_none());
    assert_eq!(engine.form().schema().len(), 3);
    engine.edit("logit_bias", json!({"50256": -100}), true).expect("edit opaque field");
    assert_eq!(engine.form().status("logit_bias"), Some(&FieldStatus::Valid));
    assert!(engine.validate_all().is_submittable());
}

#[tokio::test]
async fn missing_provider_falls_back_to_default() {
    let (mut engine, source) = engine_for("retired-model", ValueSet::new()).await;

    let outcome = engine.switch_with(&source).await;

    assert_eq!(outcome.ticket().provider_id, "chat");
    let signals = engine.take_signals();
    assert!(signals.contains(&PanelSignal::ProviderSubstituted {
        missing: "retired-model".into(),
        substitute: "chat".into(),
        substitute_name: "Chat Model".into(),
    }));
    assert_eq!(engine.displayed_provider().map(|provider| provider.display_name.as_str()), Some("Chat Model"));
}

#[tokio::test]
async fn loader_results_feed_the_engine() {
    let (mut engine, source) = engine_for("chat", ValueSet::new()).await;
    let (mut loader, mut receiver) = CatalogLoader::new(Arc::new(source));

    let first = engine.begin_switch();
    loader.load(first);
    let second = engine
        .select_provider("completion")
        .expect("completion is known")
        .expect("provider changed");
    loader.load(second.clone());

    let loaded = receiver.recv().await.expect("catalog delivered");
    assert_eq!(loaded.ticket, second);
    let outcome = engine.apply_catalog(loaded.ticket, loaded.result);

    assert!(matches!(outcome, SwitchOutcome::Applied { .. }));
    assert_eq!(engine.displayed_provider().map(|provider| provider.provider_id.as_str()), Some("completion"));
    assert!(engine.pending_switch().is_none());
}
