// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ApiError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum AuthPlugin {
    #[serde(rename = "X-Pack")]
    XPack,
    OpenSearch,
    SearchGuard,
    OpenDistro,
}

impl AuthPlugin {
    /// Plugins that need an admin certificate to run `securityadmin.sh`.
    pub fn needs_admin_certificate(&self) -> bool {
        matches!(self, AuthPlugin::OpenSearch | AuthPlugin::SearchGuard | AuthPlugin::OpenDistro)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionSecurityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_group: Option<i64>,
}

/// A database version as published in the version catalog.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionCatalogEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub db_image: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default)]
    pub security_context: VersionSecurityContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_plugin: Option<AuthPlugin>,
}

impl VersionCatalogEntry {
    pub fn run_as_user(&self) -> Option<i64> {
        self.security_context.run_as_user
    }

    /// Group id for the database containers, the user id when the entry has none.
    pub fn run_as_group(&self) -> Option<i64> {
        self.security_context.run_as_group.or(self.security_context.run_as_user)
    }

    /// Deprecated versions can still be defaulted but not created or updated.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.deprecated {
            return Err(ApiError::DeprecatedVersion(self.name.clone()));
        }
        Ok(())
    }
}

/// Source of version catalog entries, keyed by version name.
pub trait VersionCatalog {
    fn get(&self, version: &str) -> Result<VersionCatalogEntry>;
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct InMemoryVersionCatalog {
    versions: BTreeMap<String, VersionCatalogEntry>,
}

impl InMemoryVersionCatalog {
    pub fn new(entries: impl IntoIterator<Item = VersionCatalogEntry>) -> Self {
        InMemoryVersionCatalog {
            versions: entries.into_iter().map(|entry| (entry.name.clone(), entry)).collect(),
        }
    }

    /// Load a catalog from a YAML or JSON document holding a list of entries.
    pub fn from_yaml(document: &str) -> std::result::Result<Self, serde_norway::Error> {
        let entries: Vec<VersionCatalogEntry> = serde_norway::from_str(document)?;
        Ok(Self::new(entries))
    }

    pub fn insert(&mut self, entry: VersionCatalogEntry) {
        self.versions.insert(entry.name.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl VersionCatalog for InMemoryVersionCatalog {
    fn get(&self, version: &str) -> Result<VersionCatalogEntry> {
        self.versions
            .get(version)
            .cloned()
            .ok_or_else(|| ApiError::VersionLookup {
                version: version.to_string(),
                reason: "not found in catalog".to_string(),
            })
    }
}
