use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use knobs_engine::{
    CatalogSource, DirectoryCatalogSource, ProviderSelector, SessionHandle, SwitchOutcome, SyncEngine, build_schema,
    resolve_settings_with_report,
};
use knobs_types::{ParameterCatalog, ProviderDescriptor, SessionState, ValueSet};
use knobs_util::PanelConfig;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    let config = PanelConfig::load().context("load panel config")?;
    debug!(?config, "panel config loaded");

    match matches.subcommand() {
        Some(("resolve", sub)) => run_resolve(sub),
        Some(("validate", sub)) => run_validate(sub),
        Some(("switch", sub)) => run_switch(sub, &config).await,
        _ => anyhow::bail!("expected one of: resolve, validate, switch"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new("knobs")
        .about("Resolve, validate, and synchronize provider generation settings")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("resolve")
                .about("Seed a provider's parameters from stored values")
                .arg(path_arg("catalog", "Provider descriptor or parameter list (JSON/YAML)").required(true))
                .arg(path_arg("current", "Current session values"))
                .arg(path_arg("original", "Values captured when the session was loaded")),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate values against a provider's parameters")
                .arg(path_arg("catalog", "Provider descriptor or parameter list (JSON/YAML)").required(true))
                .arg(path_arg("values", "Values to validate").required(true)),
        )
        .subcommand(
            Command::new("switch")
                .about("Switch a stored session to another provider")
                .arg(path_arg("session", "Session state file").required(true))
                .arg(Arg::new("to").long("to").action(ArgAction::Set).required(true).help("Target provider id"))
                .arg(path_arg("catalog-dir", "Directory of provider descriptors"))
                .arg(
                    Arg::new("set")
                        .long("set")
                        .action(ArgAction::Append)
                        .value_name("ID=JSON")
                        .help("Edit a field after switching; the value is parsed as JSON, falling back to text"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write the resulting session back to the session file"),
                ),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::Set)
        .value_parser(clap::value_parser!(PathBuf))
        .help(help)
}

fn run_resolve(matches: &ArgMatches) -> Result<()> {
    let catalog = load_catalog(required_path(matches, "catalog")?)?;
    let current = optional_values(matches, "current")?;
    let original = optional_values(matches, "original")?;

    let report = resolve_settings_with_report(&catalog, &current, &original);
    let validation = build_schema(&catalog).validate(&report.values);
    let output = json!({
        "values": report.values,
        "sources": report.sources.iter().map(|(id, source)| (id.clone(), json!(source))).collect::<serde_json::Map<_, _>>(),
        "incompatible": report.incompatible,
        "validation": validation,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_validate(matches: &ArgMatches) -> Result<()> {
    let catalog = load_catalog(required_path(matches, "catalog")?)?;
    let values: ValueSet = read_structured(required_path(matches, "values")?)?;

    let report = build_schema(&catalog).validate(&values);
    println!("{}", serde_json::to_string_pretty(&report)?);
    let errors = report.errors();
    if !errors.is_empty() {
        anyhow::bail!("{} field(s) failed validation", errors.len());
    }
    Ok(())
}

async fn run_switch(matches: &ArgMatches, config: &PanelConfig) -> Result<()> {
    let session_path = required_path(matches, "session")?;
    let target = matches.get_one::<String>("to").context("missing --to")?;
    let catalog_dir = matches
        .get_one::<PathBuf>("catalog-dir")
        .cloned()
        .or_else(|| config.catalog_dir.clone())
        .context("no catalog directory; pass --catalog-dir or set catalog_dir in the config")?;

    let state: SessionState = read_structured(session_path)?;
    let source = DirectoryCatalogSource::new(&catalog_dir);
    let providers = source
        .providers()
        .await
        .with_context(|| format!("list providers in {}", catalog_dir.display()))?;
    let default_provider = config.default_provider.as_deref().unwrap_or(target);
    let selector = ProviderSelector::new(providers, default_provider)?;

    let session = SessionHandle::new(state);
    let mut engine = SyncEngine::new(session.clone(), selector);
    info!(from = %session.snapshot().active_provider_id(), to = %target, "switching provider");
    let outcome = match engine.select_provider(target)? {
        Some(ticket) => {
            let result = source.fetch(&ticket.provider_id).await;
            engine.apply_catalog(ticket, result)
        }
        None => engine.switch_with(&source).await,
    };
    if let SwitchOutcome::Failed { error, .. } = outcome {
        return Err(error).context("switch provider");
    }

    for assignment in matches.get_many::<String>("set").into_iter().flatten() {
        let (id, value) = parse_assignment(assignment)?;
        engine
            .edit(id, value, config.validate_on_change)
            .with_context(|| format!("apply --set {assignment}"))?;
    }
    let validation = engine.validate_all();

    let snapshot = session.snapshot();
    if matches.get_flag("write") {
        std::fs::write(session_path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("write {}", session_path.display()))?;
    }
    let output = json!({
        "session": snapshot,
        "validation": validation,
        "signals": engine.take_signals(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Catalog files hold either a full provider descriptor or a bare parameter list.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Descriptor(ProviderDescriptor),
    Parameters(ParameterCatalog),
}

fn load_catalog(path: &Path) -> Result<ParameterCatalog> {
    Ok(match read_structured::<CatalogFile>(path)? {
        CatalogFile::Descriptor(descriptor) => descriptor.parameters,
        CatalogFile::Parameters(parameters) => parameters,
    })
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    matches
        .get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing --{name}"))
}

fn optional_values(matches: &ArgMatches, name: &str) -> Result<ValueSet> {
    match matches.get_one::<PathBuf>(name) {
        Some(path) => read_structured(path),
        None => Ok(ValueSet::new()),
    }
}

fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_yaml = matches!(path.extension().and_then(|extension| extension.to_str()), Some("yaml" | "yml"));
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("parse {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))
    }
}

fn parse_assignment(assignment: &str) -> Result<(&str, Value)> {
    let (id, raw) = assignment
        .split_once('=')
        .with_context(|| format!("expected ID=JSON, got '{assignment}'"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((id.trim(), value))
}
