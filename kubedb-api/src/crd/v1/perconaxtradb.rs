// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPONENT_DATABASE, PERCONA_XTRADB_CERT_MOUNT_PATH, PERCONA_XTRADB_CONTAINER_NAME,
    PERCONA_XTRADB_COORDINATOR_CONTAINER_NAME, PERCONA_XTRADB_DEFAULT_CLUSTER_SIZE, PERCONA_XTRADB_INIT_CONTAINER_NAME,
    PERCONA_XTRADB_MAX_CLUSTER_NAME_LENGTH, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus, SecretReference}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, FieldPath, spec_path};

pub static PERCONA_XTRADB_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "PerconaXtraDB",
    plural: "perconaxtradbs",
    singular: "perconaxtradb",
    short_code: "px",
    container: PERCONA_XTRADB_CONTAINER_NAME,
    init_container: Some(PERCONA_XTRADB_INIT_CONTAINER_NAME),
    coordinator_container: Some(PERCONA_XTRADB_COORDINATOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "PerconaXtraDB",
    group = "kubedb.com",
    version = "v1",
    plural = "perconaxtradbs",
    shortname = "px",
    status = "DatabaseStatus",
    doc = "PerconaXtraDB is a specification for a Percona XtraDB Galera cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PerconaXtraDBSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_user_secrets: Option<SystemUserSecretsSpec>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[serde(rename = "requireSSL")]
    pub require_ssl: bool,
}

/// Credentials of the internal users the cluster members talk to each other with.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemUserSecretsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_user_secret: Option<SecretReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_user_secret: Option<SecretReference>,
}

impl PerconaXtraDB {
    pub fn is_cluster(&self) -> bool {
        self.spec.common.replicas.unwrap_or(1) > 1
    }

    pub fn cluster_name(&self) -> String {
        self.offshoot_name()
    }

    pub fn replication_secret_name(&self) -> String {
        self.spec
            .system_user_secrets
            .as_ref()
            .and_then(|s| s.replication_user_secret.as_ref())
            .map(|s| s.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| name_with_suffix(&self.offshoot_name(), "replication"))
    }

    pub fn monitor_secret_name(&self) -> String {
        self.spec
            .system_user_secrets
            .as_ref()
            .and_then(|s| s.monitor_user_secret.as_ref())
            .map(|s| s.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| name_with_suffix(&self.offshoot_name(), "monitor"))
    }

    /// Directory the certificate of `alias` is mounted at.
    pub fn cert_mount_path(&self, alias: &str) -> String {
        format!("{}/{}", PERCONA_XTRADB_CERT_MOUNT_PATH, alias)
    }
}

impl Database for PerconaXtraDB {
    fn descriptor(&self) -> &'static KindDescriptor {
        &PERCONA_XTRADB_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        TopologyShape::from_replicas(self.spec.common.replicas)
    }

    fn default_replicas(&self) -> i32 {
        PERCONA_XTRADB_DEFAULT_CLUSTER_SIZE
    }

    /// The coordinator runs next to every server, standalone included.
    fn uses_coordinator(&self) -> bool {
        true
    }

    fn extra_persistent_secrets(&self) -> Vec<String> {
        let Some(system) = self.spec.system_user_secrets.as_ref() else { return Vec::new() };
        [system.replication_user_secret.as_ref(), system.monitor_user_secret.as_ref()]
            .into_iter()
            .flatten()
            .map(|secret| secret.name.clone())
            .collect()
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        if self.spec.common.replicas == Some(2) {
            errors.invalid(
                spec_path().child("replicas"),
                2,
                "a Galera cluster needs at least 3 members, use 1 for a standalone server",
            );
        }
        if self.is_cluster() && self.name_any().len() > PERCONA_XTRADB_MAX_CLUSTER_NAME_LENGTH {
            errors.invalid(
                FieldPath::new("metadata").child("name"),
                self.name_any(),
                format!("cluster name can not be longer than {} characters", PERCONA_XTRADB_MAX_CLUSTER_NAME_LENGTH),
            );
        }
        if self.spec.require_ssl && self.spec.common.tls.is_none() {
            errors.invalid(spec_path().child("requireSSL"), true, "requireSSL needs spec.tls to be set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::TlsConfig;
    use crate::crd::v1::testing::{entry, issuer};
    use crate::defaults::apply_defaults;

    fn perconaxtradb(replicas: Option<i32>) -> PerconaXtraDB {
        PerconaXtraDB::new("px", PerconaXtraDBSpec {
            common: DatabaseCommonSpec { version: "8.0.31".to_string(), replicas, ..Default::default() },
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults_to_three_member_cluster() {
        let mut db = perconaxtradb(None);

        apply_defaults(&mut db, &entry("8.0.31", 1001)).unwrap();

        let spec = &db.spec.common.pod_template.spec;
        assert_eq!(db.spec.common.replicas, Some(3));
        assert_eq!(spec.init_containers[0].name, "px-init");
        let names: Vec<_> = spec.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["perconaxtradb", "px-coordinator"]);
        assert_eq!(spec.containers[1].resources, Some(ResourceProfile::Coordinator.requirements()));
    }

    #[test]
    fn test_standalone_keeps_coordinator() {
        let mut db = perconaxtradb(Some(1));

        apply_defaults(&mut db, &entry("8.0.31", 1001)).unwrap();

        assert!(!db.is_cluster());
        assert_eq!(db.spec.common.pod_template.spec.containers.len(), 2);
    }

    #[test]
    fn test_system_user_secrets() {
        let mut db = perconaxtradb(Some(3));
        assert_eq!(db.replication_secret_name(), "px-replication");
        assert_eq!(db.monitor_secret_name(), "px-monitor");
        assert!(db.persistent_secrets().is_empty());

        db.spec.system_user_secrets = Some(SystemUserSecretsSpec {
            replication_user_secret: Some(SecretReference { name: "repl".to_string(), ..Default::default() }),
            monitor_user_secret: None,
        });

        assert_eq!(db.replication_secret_name(), "repl");
        assert_eq!(db.monitor_secret_name(), "px-monitor");
        assert_eq!(db.persistent_secrets(), vec!["repl".to_string()]);
    }

    #[test]
    fn test_tls_secret_names() {
        let mut db = perconaxtradb(Some(3));
        db.spec.common.tls = Some(TlsConfig { issuer_ref: Some(issuer()), ..Default::default() });

        apply_defaults(&mut db, &entry("8.0.31", 1001)).unwrap();

        assert_eq!(db.cert_secret_name("server"), "px-server-cert");
        assert_eq!(db.cert_secret_name("metrics-exporter"), "px-metrics-exporter-cert");
        assert_eq!(db.cert_mount_path("client"), "/etc/mysql/certs/client");
    }

    #[test]
    fn test_validation() {
        let mut db = perconaxtradb(Some(2));
        db.metadata.name = Some("a-percona-cluster-name-that-is-too-long".to_string());
        db.spec.require_ssl = true;
        let mut errors = FieldErrorList::default();

        db.validate_kind(&mut errors);

        assert!(errors.has_path("spec.replicas"));
        assert!(errors.has_path("metadata.name"));
        assert!(errors.has_path("spec.requireSSL"));
    }
}
