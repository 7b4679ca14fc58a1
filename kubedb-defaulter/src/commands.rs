// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::fs;
use std::io::{self, Read};
use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::StatefulSet;
use serde::Deserialize;

use kubedb_api::{AnyDatabase, ApiError, InMemoryVersionCatalog, InMemoryWorkloadLister};
use kubedb_common::config::{DefaulterConfig, OutputFormat};
use kubedb_common::telemetry::{info, warn};
use kubedb_common::utils::compute_object_hash;

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
}

pub fn load_catalog(path: &str) -> Result<InMemoryVersionCatalog> {
    let document = read_input(path)?;
    InMemoryVersionCatalog::from_yaml(&document).with_context(|| format!("failed to parse catalog {}", path))
}

pub fn parse_manifest(document: &str) -> Result<AnyDatabase> {
    AnyDatabase::from_yaml(document).context("failed to parse manifest")
}

fn render(db: &AnyDatabase, output: OutputFormat) -> Result<String> {
    Ok(match output {
        OutputFormat::Yaml => db.to_yaml()?,
        OutputFormat::Json => serde_json::to_string_pretty(&db.to_value()?)?,
    })
}

/// Default `db` and render it. A version missing from the catalog is only
/// fatal when the configuration says so; otherwise the manifest is rendered
/// as it was read.
pub fn default(mut db: AnyDatabase, catalog: &InMemoryVersionCatalog, config: &DefaulterConfig) -> Result<String> {
    match db.set_defaults(catalog) {
        Ok(()) => {
            info!(event = "Defaulted", kind = db.kind(), name = db.name().as_str());
        },
        Err(ApiError::VersionLookup { version, reason }) if !config.fail_on_missing_version => {
            warn!(
                event = "VersionLookupFailed",
                kind = db.kind(),
                name = db.name().as_str(),
                version = version.as_str(),
                reason = reason.as_str(),
            );
        },
        Err(e) => return Err(e.into()),
    }
    render(&db, config.output)
}

pub fn validate(db: &AnyDatabase, catalog: &InMemoryVersionCatalog, delete: bool) -> Result<String> {
    if delete {
        db.validate_delete()?;
    } else {
        db.validate_create_or_update(catalog)?;
    }
    info!(event = "Validated", kind = db.kind(), name = db.name().as_str(), delete = delete);
    Ok(format!("{} {} is valid\n", db.kind(), db.name()))
}

pub fn names(db: &AnyDatabase) -> Result<String> {
    Ok(serde_norway::to_string(&db.names())?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkloadList {
    Items(Vec<StatefulSet>),
    List { items: Vec<StatefulSet> },
}

pub fn parse_workloads(document: &str) -> Result<Vec<StatefulSet>> {
    let list: WorkloadList = serde_norway::from_str(document).context("failed to parse workloads")?;
    Ok(match list {
        WorkloadList::Items(items) | WorkloadList::List { items } => items,
    })
}

pub fn ready(db: &AnyDatabase, workloads: Vec<StatefulSet>) -> Result<String> {
    let lister = InMemoryWorkloadLister::new(workloads);
    let readiness = db.replicas_are_ready(&lister)?;
    Ok(serde_norway::to_string(&readiness)?)
}

pub fn hash(db: &AnyDatabase) -> Result<String> {
    Ok(format!("{}\n", compute_object_hash(&db.to_value()?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedb_api::VersionCatalogEntry;
    use kubedb_api::catalog::VersionSecurityContext;

    const MYSQL: &str = r#"
apiVersion: kubedb.com/v1
kind: MySQL
metadata:
  name: my
  namespace: demo
spec:
  version: "8.0.35"
"#;

    fn catalog() -> InMemoryVersionCatalog {
        InMemoryVersionCatalog::new(vec![VersionCatalogEntry {
            name: "8.0.35".to_string(),
            version: "8.0.35".to_string(),
            db_image: "mysql:8.0.35".to_string(),
            security_context: VersionSecurityContext { run_as_user: Some(999), run_as_group: None },
            ..Default::default()
        }])
    }

    #[test]
    fn test_default_then_hash_is_stable() {
        let config = DefaulterConfig::default();
        let once = default(parse_manifest(MYSQL).unwrap(), &catalog(), &config).unwrap();
        let twice = default(parse_manifest(&once).unwrap(), &catalog(), &config).unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            hash(&parse_manifest(&once).unwrap()).unwrap(),
            hash(&parse_manifest(&twice).unwrap()).unwrap(),
        );
    }

    #[test]
    fn test_missing_version_passes_through_when_allowed() {
        let config = DefaulterConfig { fail_on_missing_version: false, ..Default::default() };
        let empty = InMemoryVersionCatalog::default();

        let output = default(parse_manifest(MYSQL).unwrap(), &empty, &config).unwrap();

        assert_eq!(parse_manifest(&output).unwrap(), parse_manifest(MYSQL).unwrap());
        assert!(default(parse_manifest(MYSQL).unwrap(), &empty, &DefaulterConfig::default()).is_err());
    }

    #[test]
    fn test_json_output() {
        let config = DefaulterConfig { output: OutputFormat::Json, ..Default::default() };

        let output = default(parse_manifest(MYSQL).unwrap(), &catalog(), &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["spec"]["deletionPolicy"], "Delete");
    }

    #[test]
    fn test_parse_workloads_accepts_list_object() {
        let items = parse_workloads("kind: List\nitems:\n- metadata:\n    name: my\n").unwrap();
        assert_eq!(items.len(), 1);

        let items = parse_workloads("- metadata:\n    name: my\n- metadata:\n    name: other\n").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_ready_without_workloads() {
        let output = ready(&parse_manifest(MYSQL).unwrap(), Vec::new()).unwrap();

        assert!(output.contains("ready: false"));
    }
}
