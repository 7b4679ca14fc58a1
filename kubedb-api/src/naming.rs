// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::ResourceExt;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{
    COMPONENT_LABEL_KEY, GROUP_NAME, INSTANCE_LABEL_KEY, LABEL_ROLE,
    MANAGED_BY_LABEL_KEY, NAME_LABEL_KEY, ROLE_STATS,
};
use crate::crd::{Database, common::{NamedServiceTemplateSpec, ServiceAlias}, kind::RoleRef};
use crate::meta::{merge_user_labels, name_with_prefix, name_with_suffix, overwrite_keys};
use crate::tls::{certificate_name, get_certificate_secret_name};

/// Names and labels of the objects a database owns, all derived from the
/// database identity. Nothing here is stored on the resource.
pub trait Offshoot: Database {
    fn offshoot_name(&self) -> String {
        self.name_any()
    }

    fn resource_fqn(&self) -> String {
        self.descriptor().resource_fqn()
    }

    fn resource_kind(&self) -> &'static str {
        self.descriptor().kind
    }

    fn resource_plural(&self) -> &'static str {
        self.descriptor().plural
    }

    fn resource_singular(&self) -> &'static str {
        self.descriptor().singular
    }

    fn resource_short_code(&self) -> &'static str {
        self.descriptor().short_code
    }

    fn namespace_or_default(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    fn service_name(&self) -> String {
        self.offshoot_name()
    }

    fn standby_service_name(&self) -> String {
        name_with_prefix("standby", &self.service_name())
    }

    fn stats_service_name(&self) -> String {
        name_with_suffix(&self.service_name(), ROLE_STATS)
    }

    fn governing_service_name(&self) -> String {
        name_with_suffix(&self.service_name(), "pods")
    }

    fn primary_service_dns(&self) -> String {
        format!("{}.{}.svc", self.service_name(), self.namespace_or_default())
    }

    fn standby_service_dns(&self) -> String {
        format!("{}.{}.svc", self.standby_service_name(), self.namespace_or_default())
    }

    /// Stable network identity of the pod with ordinal `index`.
    fn peer_name(&self, index: usize) -> String {
        format!(
            "{}-{}.{}.{}",
            self.offshoot_name(),
            index,
            self.governing_service_name(),
            self.namespace_or_default()
        )
    }

    fn hosts(&self) -> Vec<String> {
        let replicas = self.common().replicas.unwrap_or(1).max(0);
        (0..replicas)
            .map(|i| format!("{}.svc", self.peer_name(i as usize)))
            .collect()
    }

    fn auth_secret_name(&self) -> String {
        match self.common().auth_secret.as_ref() {
            Some(secret) if !secret.name.is_empty() => secret.name.clone(),
            _ => name_with_suffix(&self.offshoot_name(), "auth"),
        }
    }

    /// Name of the generated configuration secret, per component when given.
    fn config_secret_name(&self, component: Option<&str>) -> String {
        let base = match component {
            Some(component) if !component.is_empty() => name_with_suffix(&self.offshoot_name(), component),
            _ => self.offshoot_name(),
        };
        name_with_suffix(&base, "config")
    }

    /// Secrets that must survive a `Halt` or `Delete`.
    fn persistent_secrets(&self) -> Vec<String> {
        let mut secrets = Vec::new();
        if let Some(secret) = self.common().auth_secret.as_ref() {
            secrets.push(secret.name.clone());
        }
        secrets.extend(self.extra_persistent_secrets());
        secrets
    }

    fn certificate_name(&self, alias: &str) -> String {
        certificate_name(&self.offshoot_name(), alias)
    }

    /// Certificate name for a child workload, e.g. one shard of a cluster.
    fn child_certificate_name(&self, child: &str, alias: &str) -> String {
        certificate_name(child, alias)
    }

    /// The user's secret name for the alias, else the derived one.
    fn cert_secret_name(&self, alias: &str) -> String {
        self.common()
            .tls
            .as_ref()
            .and_then(|tls| get_certificate_secret_name(&tls.certificates, alias))
            .map(str::to_string)
            .unwrap_or_else(|| self.certificate_name(alias))
    }

    fn offshoot_selectors(&self, extra: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
        let selectors = BTreeMap::from([
            (NAME_LABEL_KEY.to_string(), self.resource_fqn()),
            (INSTANCE_LABEL_KEY.to_string(), self.offshoot_name()),
            (MANAGED_BY_LABEL_KEY.to_string(), GROUP_NAME.to_string()),
        ]);
        let selectors = overwrite_keys(selectors, &[&self.kind_selectors()]);
        overwrite_keys(selectors, extra)
    }

    /// Selector plus component label layered over the resource's own labels
    /// and `overrides`. Computed keys always win.
    fn labels_from(
        &self,
        selectors: BTreeMap<String, String>,
        overrides: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let computed = overwrite_keys(selectors, &[&BTreeMap::from([
            (COMPONENT_LABEL_KEY.to_string(), self.descriptor().component.to_string()),
        ])]);
        let user = overwrite_keys(self.labels().clone(), &[overrides]);
        merge_user_labels(computed, &user)
    }

    fn offshoot_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.offshoot_selectors(&[]), &BTreeMap::new())
    }

    fn pod_labels(&self, extra: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
        self.labels_from(self.offshoot_selectors(extra), &self.common().pod_template.metadata.labels)
    }

    fn pod_controller_labels(&self, extra: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
        self.labels_from(self.offshoot_selectors(extra), &self.common().pod_template.controller.labels)
    }

    fn service_template(&self, alias: ServiceAlias) -> Option<&NamedServiceTemplateSpec> {
        let alias = alias.to_string();
        self.common().service_templates.iter().find(|t| t.alias == alias)
    }

    fn service_labels(&self, alias: ServiceAlias, extra: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
        let overrides = self
            .service_template(alias)
            .map(|t| t.metadata.labels.clone())
            .unwrap_or_default();
        self.labels_from(self.offshoot_selectors(extra), &overrides)
    }

    fn stats_service_labels(&self) -> BTreeMap<String, String> {
        let role = BTreeMap::from([(LABEL_ROLE.to_string(), ROLE_STATS.to_string())]);
        self.service_labels(ServiceAlias::Stats, &[&role])
    }

    /// Workload name of a topology role, `<name>-<suffix>`.
    fn role_workload_name(&self, role: &RoleRef<'_>) -> String {
        name_with_suffix(&self.offshoot_name(), role.effective_suffix())
    }

    fn role_selectors(&self, role: &RoleRef<'_>) -> BTreeMap<String, String> {
        let key = format!("{}.{}/role", self.resource_singular(), GROUP_NAME);
        self.offshoot_selectors(&[&BTreeMap::from([(key, role.name.to_string())])])
    }

    fn role_labels(&self, role: &RoleRef<'_>) -> BTreeMap<String, String> {
        self.labels_from(self.role_selectors(role), &role.pod_template.metadata.labels)
    }
}

impl<T: Database> Offshoot for T {}

/// Every name and label set derived from a database, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedNames {
    pub kind: String,
    pub offshoot_name: String,
    pub service_name: String,
    pub governing_service_name: String,
    pub standby_service_name: String,
    pub stats_service_name: String,
    pub primary_service_dns: String,
    pub auth_secret_name: String,
    pub config_secret_name: String,
    pub persistent_secrets: Vec<String>,
    pub workloads: Vec<String>,
    pub hosts: Vec<String>,
    /// Secret name per certificate alias
    pub certificates: BTreeMap<String, String>,
    pub offshoot_selectors: BTreeMap<String, String>,
    pub offshoot_labels: BTreeMap<String, String>,
    pub pod_labels: BTreeMap<String, String>,
}

pub fn derived_names<D: Database>(db: &D) -> DerivedNames {
    DerivedNames {
        kind: db.resource_kind().to_string(),
        offshoot_name: db.offshoot_name(),
        service_name: db.service_name(),
        governing_service_name: db.governing_service_name(),
        standby_service_name: db.standby_service_name(),
        stats_service_name: db.stats_service_name(),
        primary_service_dns: db.primary_service_dns(),
        auth_secret_name: db.auth_secret_name(),
        config_secret_name: db.config_secret_name(None),
        persistent_secrets: db.persistent_secrets(),
        workloads: db.workload_names(),
        hosts: db.hosts(),
        certificates: db
            .descriptor()
            .certificate_aliases
            .iter()
            .map(|alias| (alias.to_string(), db.cert_secret_name(alias)))
            .collect(),
        offshoot_selectors: db.offshoot_selectors(&[]),
        offshoot_labels: db.offshoot_labels(),
        pod_labels: db.pod_labels(&[]),
    }
}
