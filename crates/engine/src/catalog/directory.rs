//! Catalog source reading provider descriptors from a directory.
//!
//! Each provider lives in `<dir>/<provider_id>.json`, `.yaml`, or `.yml`. The
//! file holds a full [`ProviderDescriptor`]; its `provider_id` must match the
//! file stem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use knobs_types::{ProviderDescriptor, ProviderSummary};
use tracing::{debug, warn};

use super::{CatalogSource, CatalogSourceError};

const DESCRIPTOR_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Catalog source backed by descriptor files on disk.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogSource {
    root: PathBuf,
}

impl DirectoryCatalogSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn locate(&self, provider_id: &str) -> Option<PathBuf> {
        for extension in DESCRIPTOR_EXTENSIONS {
            let candidate = self.root.join(format!("{provider_id}.{extension}"));
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

#[async_trait]
impl CatalogSource for DirectoryCatalogSource {
    async fn fetch(&self, provider_id: &str) -> Result<ProviderDescriptor, CatalogSourceError> {
        if !is_plain_identifier(provider_id) {
            return Err(CatalogSourceError::not_found(provider_id));
        }
        let path = self
            .locate(provider_id)
            .await
            .ok_or_else(|| CatalogSourceError::not_found(provider_id))?;
        debug!(provider_id = %provider_id, path = %path.display(), "reading provider descriptor");

        let descriptor = read_descriptor(&path)
            .await
            .map_err(|reason| CatalogSourceError::malformed(provider_id, reason))?;
        if descriptor.provider_id != provider_id {
            return Err(CatalogSourceError::malformed(
                provider_id,
                format!("descriptor declares provider_id '{}'", descriptor.provider_id),
            ));
        }
        Ok(descriptor)
    }

    async fn providers(&self) -> Result<Vec<ProviderSummary>, CatalogSourceError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|error| CatalogSourceError::unavailable("*", format!("{}: {}", self.root.display(), error)))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| CatalogSourceError::unavailable("*", error.to_string()))?
        {
            let path = entry.path();
            let has_descriptor_extension = path
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| DESCRIPTOR_EXTENSIONS.contains(&extension));
            if !has_descriptor_extension {
                continue;
            }
            match read_descriptor(&path).await {
                Ok(descriptor) => summaries.push(descriptor.summary()),
                Err(reason) => warn!(path = %path.display(), error = %reason, "skipping unreadable provider descriptor"),
            }
        }
        summaries.sort_by(|left, right| left.provider_id.cmp(&right.provider_id));
        Ok(summaries)
    }
}

async fn read_descriptor(path: &Path) -> Result<ProviderDescriptor, String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| format!("{}: {}", path.display(), error))?;
    let is_json = path.extension().and_then(|extension| extension.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(&content).map_err(|error| error.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|error| error.to_string())
    }
}

fn is_plain_identifier(provider_id: &str) -> bool {
    !provider_id.is_empty()
        && provider_id != "."
        && provider_id != ".."
        && !provider_id.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use knobs_types::ParameterKind;
    use std::fs;

    const CHAT_YAML: &str = r#"
provider_id: chat
display_name: Chat Model
is_chat_oriented: true
parameters:
  - id: temperature
    kind: numeric_range
    min: 0
    max: 2
    initial: 1
  - id: stop
    kind: tag_list
"#;

    #[tokio::test]
    async fn reads_yaml_and_json_descriptors() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(temp_dir.path().join("chat.yaml"), CHAT_YAML).expect("write yaml");
        fs::write(
            temp_dir.path().join("completion.json"),
            r#"{"provider_id":"completion","display_name":"Completion","parameters":[{"id":"echo","kind":"toggle"}]}"#,
        )
        .expect("write json");
        let source = DirectoryCatalogSource::new(temp_dir.path());

        let chat = source.fetch("chat").await.expect("chat descriptor");
        let completion = source.fetch("completion").await.expect("completion descriptor");

        assert!(chat.is_chat_oriented);
        assert_eq!(chat.parameters.len(), 2);
        assert_eq!(completion.parameters.get("echo").map(|spec| &spec.kind), Some(&ParameterKind::Toggle));
    }

    #[tokio::test]
    async fn missing_and_traversal_ids_are_not_found() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let source = DirectoryCatalogSource::new(temp_dir.path());

        assert_eq!(source.fetch("ghost").await, Err(CatalogSourceError::not_found("ghost")));
        assert_eq!(source.fetch("../etc").await, Err(CatalogSourceError::not_found("../etc")));
    }

    #[tokio::test]
    async fn invalid_catalog_is_reported_as_malformed() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp_dir.path().join("broken.json"),
            r#"{"provider_id":"broken","display_name":"Broken","parameters":[{"id":"model","kind":"selection","items":[]}]}"#,
        )
        .expect("write json");
        let source = DirectoryCatalogSource::new(temp_dir.path());

        let result = source.fetch("broken").await;

        assert!(matches!(result, Err(CatalogSourceError::Malformed { ref reason, .. }) if reason.contains("declares no items")));
    }

    #[tokio::test]
    async fn mismatched_provider_id_is_malformed() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(temp_dir.path().join("chat.yaml"), CHAT_YAML.replace("provider_id: chat", "provider_id: other"))
            .expect("write yaml");
        let source = DirectoryCatalogSource::new(temp_dir.path());

        assert!(matches!(source.fetch("chat").await, Err(CatalogSourceError::Malformed { .. })));
    }

    #[tokio::test]
    async fn lists_providers_sorted_and_skips_junk() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        fs::write(temp_dir.path().join("chat.yaml"), CHAT_YAML).expect("write yaml");
        fs::write(
            temp_dir.path().join("alpha.json"),
            r#"{"provider_id":"alpha","display_name":"Alpha"}"#,
        )
        .expect("write json");
        fs::write(temp_dir.path().join("notes.txt"), "ignored").expect("write txt");
        fs::write(temp_dir.path().join("bad.json"), "{").expect("write bad json");
        let source = DirectoryCatalogSource::new(temp_dir.path());

        let providers = source.providers().await.expect("list providers");

        assert_eq!(
            providers.iter().map(|summary| summary.provider_id.as_str()).collect::<Vec<_>>(),
            vec!["alpha", "chat"]
        );
    }
}
