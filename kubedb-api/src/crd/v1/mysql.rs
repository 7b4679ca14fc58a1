// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_DATABASE, MYSQL_COMPONENT_KEY, MYSQL_COMPONENT_ROUTER, MYSQL_CONTAINER_NAME,
    MYSQL_COORDINATOR_CONTAINER_NAME, MYSQL_DEFAULT_GROUP_SIZE, MYSQL_INIT_CONTAINER_NAME,
    MYSQL_ROUTER_CONTAINER_NAME, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus, PodTemplateSpec}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::defaults::{ensure_container, set_container_defaults};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static MYSQL_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "MySQL",
    plural: "mysqls",
    singular: "mysql",
    short_code: "my",
    container: MYSQL_CONTAINER_NAME,
    init_container: Some(MYSQL_INIT_CONTAINER_NAME),
    coordinator_container: Some(MYSQL_COORDINATOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "MySQL",
    group = "kubedb.com",
    version = "v1",
    plural = "mysqls",
    shortname = "my",
    status = "DatabaseStatus",
    doc = "MySQL is a specification for a MySQL database managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MySQLSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Clustering mode of the servers. Unset means a single standalone server.
    pub topology: Option<MySQLTopology>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum MySQLMode {
    GroupReplication,
    InnoDBCluster,
    RemoteReplica,
    SemiSync,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum MySQLGroupMode {
    #[serde(rename = "Single-Primary")]
    SinglePrimary,
    #[serde(rename = "Multi-Primary")]
    MultiPrimary,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MySQLTopology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MySQLMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<MySQLGroupSpec>,
    #[serde(rename = "innoDBCluster", skip_serializing_if = "Option::is_none")]
    pub inno_db_cluster: Option<MySQLInnoDBClusterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semi_sync: Option<SemiSyncSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MySQLGroupSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MySQLGroupMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Replication group name, a version 4 UUID
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MySQLInnoDBClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MySQLGroupMode>,
    pub router: MySQLRouterSpec,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MySQLRouterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplateSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SemiSyncSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_wait_for_replica_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errant_transaction_recovery_policy: Option<String>,
}

impl MySQL {
    pub fn mode(&self) -> Option<MySQLMode> {
        self.spec.topology.as_ref().and_then(|t| t.mode)
    }

    pub fn uses_group_replication(&self) -> bool {
        self.mode() == Some(MySQLMode::GroupReplication)
    }

    pub fn is_innodb_cluster(&self) -> bool {
        self.mode() == Some(MySQLMode::InnoDBCluster)
    }

    pub fn is_remote_replica(&self) -> bool {
        self.mode() == Some(MySQLMode::RemoteReplica)
    }

    pub fn is_semi_sync(&self) -> bool {
        self.mode() == Some(MySQLMode::SemiSync)
    }

    /// Group replication, InnoDB cluster and semi-sync all run a
    /// coordinated group of servers.
    pub fn is_clustered(&self) -> bool {
        self.uses_group_replication() || self.is_innodb_cluster() || self.is_semi_sync()
    }

    pub fn router_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), MYSQL_COMPONENT_ROUTER)
    }

    pub fn router_offshoot_selectors(&self) -> BTreeMap<String, String> {
        let component = BTreeMap::from([(MYSQL_COMPONENT_KEY.to_string(), MYSQL_COMPONENT_ROUTER.to_string())]);
        self.offshoot_selectors(&[&component])
    }

    pub fn router_offshoot_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.router_offshoot_selectors(), &BTreeMap::new())
    }

    pub fn router_pod_labels(&self) -> BTreeMap<String, String> {
        let overrides = self
            .router_pod_template()
            .map(|t| t.metadata.labels.clone())
            .unwrap_or_default();
        self.labels_from(self.router_offshoot_selectors(), &overrides)
    }

    fn router_pod_template(&self) -> Option<&PodTemplateSpec> {
        self.spec
            .topology
            .as_ref()
            .and_then(|t| t.inno_db_cluster.as_ref())
            .and_then(|c| c.router.pod_template.as_ref())
    }

    fn set_router_defaults(&mut self, entry: &VersionCatalogEntry) {
        let Some(cluster) = self.spec.topology.as_mut().and_then(|t| t.inno_db_cluster.as_mut()) else {
            return;
        };

        cluster.router.replicas.get_or_insert(1);
        let template = cluster.router.pod_template.get_or_insert_with(PodTemplateSpec::default);
        let context = template.spec.security_context.get_or_insert_with(Default::default);
        if context.fs_group.is_none() {
            context.fs_group = entry.run_as_user();
        }

        let router = ensure_container(&mut template.spec.containers, MYSQL_ROUTER_CONTAINER_NAME);
        set_container_defaults(router, entry, ResourceProfile::Coordinator);
    }
}

impl Database for MySQL {
    fn descriptor(&self) -> &'static KindDescriptor {
        &MYSQL_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        if self.is_clustered() {
            return TopologyShape::Replicated {
                replicas: self.spec.common.replicas.unwrap_or(MYSQL_DEFAULT_GROUP_SIZE),
            };
        }
        TopologyShape::from_replicas(self.spec.common.replicas)
    }

    fn default_replicas(&self) -> i32 {
        if self.is_clustered() { MYSQL_DEFAULT_GROUP_SIZE } else { 1 }
    }

    fn uses_coordinator(&self) -> bool {
        self.is_clustered()
    }

    fn kind_selectors(&self) -> BTreeMap<String, String> {
        if self.is_innodb_cluster() {
            return BTreeMap::from([(MYSQL_COMPONENT_KEY.to_string(), COMPONENT_DATABASE.to_string())]);
        }
        BTreeMap::new()
    }

    fn apply_kind_defaults(&mut self, entry: &VersionCatalogEntry) {
        if self.is_innodb_cluster() {
            self.set_router_defaults(entry);
        }
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let topology = spec_path().child("topology");

        if self.is_innodb_cluster() {
            match self.spec.topology.as_ref().and_then(|t| t.inno_db_cluster.as_ref()) {
                None => errors.required(
                    topology.child("innoDBCluster"),
                    "innoDBCluster is required for InnoDBCluster mode",
                ),
                Some(cluster) => {
                    if let Some(replicas) = cluster.router.replicas.filter(|r| *r <= 0) {
                        errors.invalid(
                            topology.child("innoDBCluster").child("router").child("replicas"),
                            replicas,
                            "router replicas can not be 0 or less",
                        );
                    }
                },
            }
        }

        if self.is_clustered() {
            if let Some(replicas) = self.spec.common.replicas.filter(|r| *r == 1) {
                errors.invalid(
                    spec_path().child("replicas"),
                    replicas,
                    "a clustered topology needs more than one server",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::{DeletionPolicy, StorageType};
    use crate::crd::v1::testing::entry;
    use crate::defaults::apply_defaults;

    fn mysql(topology: Option<MySQLTopology>) -> MySQL {
        let mut db = MySQL::new("my-db", MySQLSpec {
            common: DatabaseCommonSpec { version: "8.0.35".to_string(), ..Default::default() },
            topology,
        });
        db.metadata.namespace = Some("demo".to_string());
        db
    }

    fn innodb() -> MySQLTopology {
        MySQLTopology {
            mode: Some(MySQLMode::InnoDBCluster),
            inno_db_cluster: Some(MySQLInnoDBClusterSpec::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_standalone_defaults() {
        let mut db = mysql(None);

        apply_defaults(&mut db, &entry("8.0.35", 999)).unwrap();

        let common = &db.spec.common;
        assert_eq!(common.replicas, Some(1));
        assert_eq!(common.storage_type, Some(StorageType::Durable));
        assert_eq!(common.deletion_policy, Some(DeletionPolicy::Delete));
        assert_eq!(common.pod_template.spec.service_account_name.as_deref(), Some("my-db"));
        let names: Vec<_> = common.pod_template.spec.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["mysql"]);
        assert_eq!(common.pod_template.spec.init_containers[0].name, "mysql-init");
    }

    #[test]
    fn test_group_replication_defaults() {
        let mut db = mysql(Some(MySQLTopology { mode: Some(MySQLMode::GroupReplication), ..Default::default() }));

        apply_defaults(&mut db, &entry("8.0.35", 999)).unwrap();

        assert_eq!(db.spec.common.replicas, Some(3));
        let containers = &db.spec.common.pod_template.spec.containers;
        assert!(containers.iter().any(|c| c.name == "mysql-coordinator"));
        assert_eq!(db.expected_workloads(), 1);
    }

    #[test]
    fn test_innodb_router_defaults() {
        let mut db = mysql(Some(innodb()));

        apply_defaults(&mut db, &entry("8.0.35", 999)).unwrap();

        let router = &db.spec.topology.as_ref().unwrap().inno_db_cluster.as_ref().unwrap().router;
        assert_eq!(router.replicas, Some(1));
        let template = router.pod_template.as_ref().unwrap();
        assert_eq!(template.spec.security_context.as_ref().unwrap().fs_group, Some(999));
        let container = &template.spec.containers[0];
        assert_eq!(container.name, "mysql-router");
        assert_eq!(container.resources, Some(ResourceProfile::Coordinator.requirements()));
    }

    #[test]
    fn test_innodb_selectors() {
        let db = mysql(Some(innodb()));

        assert_eq!(db.offshoot_selectors(&[]).get(MYSQL_COMPONENT_KEY).map(String::as_str), Some("database"));
        assert_eq!(db.router_offshoot_selectors().get(MYSQL_COMPONENT_KEY).map(String::as_str), Some("router"));
        assert_eq!(db.router_name(), "my-db-router");

        assert!(mysql(None).offshoot_selectors(&[]).get(MYSQL_COMPONENT_KEY).is_none());
    }

    #[test]
    fn test_innodb_requires_cluster_spec() {
        let db = mysql(Some(MySQLTopology { mode: Some(MySQLMode::InnoDBCluster), ..Default::default() }));
        let mut errors = FieldErrorList::default();

        db.validate_kind(&mut errors);

        assert!(errors.has_path("spec.topology.innoDBCluster"));
    }
}
