// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::{LocalObjectReference, PersistentVolumeClaimSpec};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::VersionCatalogEntry;
use crate::tls::get_certificate_secret_name;
use crate::constants::{
    COMPONENT_DATABASE, KUBEDB_ORGANIZATION, MONGODB_CONFIG_KEY, MONGODB_CONTAINER_NAME, MONGODB_DATABASE_PORT, MONGODB_INIT_CONTAINER_NAME,
    MONGODB_MONGOS_KEY, MONGODB_NODE_TYPE_ARBITER, MONGODB_NODE_TYPE_CONFIG, MONGODB_NODE_TYPE_HIDDEN,
    MONGODB_NODE_TYPE_KEY, MONGODB_NODE_TYPE_MONGOS, MONGODB_NODE_TYPE_SHARD, MONGODB_SHARD_KEY,
    REPLICATION_MODE_DETECTOR_CONTAINER_NAME, ResourceProfile,
};
use crate::crd::{Database, common::{
    CertificateSpec, DatabaseCommonSpec, DatabaseStatus, PodTemplateSpec, SecretReference, StorageType, X509Subject,
}};
use crate::crd::kind::{KindDescriptor, RoleMut, TopologyShape};
use crate::error::{ApiError, Result};
use crate::meta::{name_with_suffix, trailing_number};
use crate::naming::Offshoot;
use crate::tls::{
    certificate_name, set_missing_secret_name_for_certificate, set_missing_spec_for_certificate,
    set_secret_name_for_certificate,
};
use crate::validation::{FieldErrorList, spec_path};

pub const MONGODB_SERVER_CERT: &str = "server";
pub const MONGODB_CLIENT_CERT: &str = "client";
pub const MONGODB_METRICS_EXPORTER_CERT: &str = "metrics-exporter";

pub static MONGODB_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "MongoDB",
    plural: "mongodbs",
    singular: "mongodb",
    short_code: "mg",
    container: MONGODB_CONTAINER_NAME,
    init_container: Some(MONGODB_INIT_CONTAINER_NAME),
    coordinator_container: Some(REPLICATION_MODE_DETECTOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &[MONGODB_SERVER_CERT, MONGODB_CLIENT_CERT, MONGODB_METRICS_EXPORTER_CERT],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "MongoDB",
    group = "kubedb.com",
    version = "v1",
    plural = "mongodbs",
    shortname = "mg",
    status = "DatabaseStatus",
    doc = "MongoDB is a specification for a MongoDB server, replica set or sharded cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set: Option<MongoDBReplicaSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_topology: Option<MongoDBShardingTopology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// A voting member without data, only valid with a replica set or shards
    pub arbiter: Option<MongoArbiterNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Members invisible to clients, only valid with a replica set or shards
    pub hidden: Option<MongoHiddenNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_engine: Option<StorageEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<SSLMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_auth_mode: Option<ClusterAuthMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file_secret: Option<SecretReference>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBReplicaSet {
    /// Name of the replica set, passed to `mongod --replSet`
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDBShardingTopology {
    pub shard: MongoDBShardNode,
    pub config_server: MongoDBNode,
    pub mongos: MongoDBNode,
}

/// One kind of server in a sharded cluster.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDBNode {
    pub replicas: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Replaces the node type in workload and replica set names
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_secret: Option<LocalObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<PersistentVolumeClaimSpec>,
    pub pod_template: PodTemplateSpec,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDBShardNode {
    pub shards: i32,
    #[serde(flatten)]
    pub node: MongoDBNode,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoArbiterNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_secret: Option<LocalObjectReference>,
    pub pod_template: PodTemplateSpec,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoHiddenNode {
    pub replicas: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_secret: Option<LocalObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<PersistentVolumeClaimSpec>,
    pub pod_template: PodTemplateSpec,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum StorageEngine {
    WiredTiger,
    InMemory,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SSLMode {
    Disabled,
    AllowSSL,
    PreferSSL,
    RequireSSL,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ClusterAuthMode {
    KeyFile,
    SendKeyFile,
    SendX509,
    X509,
}

impl MongoDB {
    pub fn is_sharded(&self) -> bool {
        self.spec.shard_topology.is_some()
    }

    pub fn is_replica_set(&self) -> bool {
        self.spec.replica_set.is_some()
    }

    fn prefixed_node_name(&self, prefix: Option<&str>, node_type: &str) -> String {
        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => name_with_suffix(&self.offshoot_name(), prefix),
            None => name_with_suffix(&self.offshoot_name(), node_type),
        }
    }

    /// Common prefix of the shard workloads, `<name>-shard` unless a prefix is set.
    pub fn shard_common_node_name(&self) -> Option<String> {
        let shard = &self.spec.shard_topology.as_ref()?.shard;
        Some(self.prefixed_node_name(shard.node.prefix.as_deref(), MONGODB_NODE_TYPE_SHARD))
    }

    /// Workload name of shard `index`, e.g. `mg-shard0`.
    pub fn shard_node_name(&self, index: i32) -> Option<String> {
        self.shard_common_node_name().map(|name| format!("{}{}", name, index))
    }

    pub fn config_svr_node_name(&self) -> Option<String> {
        let config = &self.spec.shard_topology.as_ref()?.config_server;
        Some(self.prefixed_node_name(config.prefix.as_deref(), MONGODB_NODE_TYPE_CONFIG))
    }

    pub fn mongos_node_name(&self) -> Option<String> {
        let mongos = &self.spec.shard_topology.as_ref()?.mongos;
        Some(self.prefixed_node_name(mongos.prefix.as_deref(), MONGODB_NODE_TYPE_MONGOS))
    }

    pub fn arbiter_node_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), MONGODB_NODE_TYPE_ARBITER)
    }

    pub fn hidden_node_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), MONGODB_NODE_TYPE_HIDDEN)
    }

    pub fn arbiter_shard_node_name(&self, index: i32) -> Option<String> {
        self.shard_node_name(index).map(|name| name_with_suffix(&name, MONGODB_NODE_TYPE_ARBITER))
    }

    pub fn hidden_shard_node_name(&self, index: i32) -> Option<String> {
        self.shard_node_name(index).map(|name| name_with_suffix(&name, MONGODB_NODE_TYPE_HIDDEN))
    }

    /// Replica set name of shard `index`: `shard<i>`, or the prefix followed by the index.
    pub fn shard_rep_set_name(&self, index: i32) -> String {
        let prefix = self
            .spec
            .shard_topology
            .as_ref()
            .and_then(|t| t.shard.node.prefix.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(MONGODB_NODE_TYPE_SHARD);
        format!("{}{}", prefix, index)
    }

    pub fn config_svr_rep_set_name(&self) -> String {
        self.spec
            .shard_topology
            .as_ref()
            .and_then(|t| t.config_server.prefix.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or("cnfRepSet")
            .to_string()
    }

    /// Governing service of a node workload. Arbiter and hidden workloads
    /// share the service of the replica set they belong to.
    pub fn node_governing_service_name(&self, node: &str) -> Result<String> {
        if node.is_empty() {
            return Err(ApiError::MissingChildName(format!(
                "governing service of {} needs a workload name",
                self.name_any()
            )));
        }
        let base = node
            .strip_suffix(&format!("-{}", MONGODB_NODE_TYPE_ARBITER))
            .or_else(|| node.strip_suffix(&format!("-{}", MONGODB_NODE_TYPE_HIDDEN)))
            .unwrap_or(node);
        Ok(name_with_suffix(base, "pods"))
    }

    /// Shard index encoded at the end of a shard workload name.
    pub fn shard_number(&self, node: &str) -> Result<u32> {
        trailing_number(node).map(|(_, n)| n).ok_or_else(|| ApiError::InvalidChildName {
            name: node.to_string(),
            reason: "shard workload names end with the shard number".to_string(),
        })
    }

    pub fn replica_name_for_arbiter(&self, arbiter: &str) -> Result<String> {
        corresponding_replica_name(arbiter, MONGODB_NODE_TYPE_ARBITER)
    }

    pub fn replica_name_for_hidden(&self, hidden: &str) -> Result<String> {
        corresponding_replica_name(hidden, MONGODB_NODE_TYPE_HIDDEN)
    }

    fn node_hosts(&self, node: &str, replicas: i32) -> Result<Vec<String>> {
        let service = self.node_governing_service_name(node)?;
        let namespace = self.namespace_or_default();
        Ok((0..replicas.max(0))
            .map(|i| format!("{}-{}.{}.{}.svc:{}", node, i, service, namespace, MONGODB_DATABASE_PORT))
            .collect())
    }

    /// Data bearing members of a standalone server or replica set.
    pub fn replica_hosts(&self) -> Result<Vec<String>> {
        let replicas = if self.is_replica_set() { self.spec.common.replicas.unwrap_or(1) } else { 1 };
        self.node_hosts(&self.offshoot_name(), replicas)
    }

    /// Every member of the replica set, arbiter and hidden members included.
    pub fn member_hosts(&self) -> Result<Vec<String>> {
        let mut hosts = self.replica_hosts()?;
        if self.spec.arbiter.is_some() {
            hosts.extend(self.node_hosts(&self.arbiter_node_name(), 1)?);
        }
        if let Some(hidden) = self.spec.hidden.as_ref() {
            hosts.extend(self.node_hosts(&self.hidden_node_name(), hidden.replicas)?);
        }
        Ok(hosts)
    }

    /// Connection address, `<replSet>/<host>,<host>` for a replica set.
    pub fn host_address(&self) -> Result<String> {
        let hosts = self.replica_hosts()?.join(",");
        match self.spec.replica_set.as_ref() {
            Some(rs) => Ok(format!("{}/{}", rs.name, hosts)),
            None => Ok(hosts),
        }
    }

    pub fn shard_hosts(&self, index: i32) -> Result<Vec<String>> {
        let topology = self.sharding_topology()?;
        let node = self.shard_node_name(index).unwrap_or_default();
        self.node_hosts(&node, topology.shard.node.replicas)
    }

    pub fn config_svr_hosts(&self) -> Result<Vec<String>> {
        let topology = self.sharding_topology()?;
        let node = self.config_svr_node_name().unwrap_or_default();
        self.node_hosts(&node, topology.config_server.replicas)
    }

    pub fn mongos_hosts(&self) -> Result<Vec<String>> {
        let topology = self.sharding_topology()?;
        let node = self.mongos_node_name().unwrap_or_default();
        self.node_hosts(&node, topology.mongos.replicas)
    }

    fn sharding_topology(&self) -> Result<&MongoDBShardingTopology> {
        self.spec.shard_topology.as_ref().ok_or_else(|| {
            ApiError::MissingChildName(format!("{} has no shard topology", self.name_any()))
        })
    }

    pub fn shard_selectors(&self, index: i32) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(MONGODB_SHARD_KEY.to_string(), self.shard_node_name(index).unwrap_or_default())])])
    }

    pub fn config_svr_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(MONGODB_CONFIG_KEY.to_string(), self.config_svr_node_name().unwrap_or_default())])])
    }

    pub fn mongos_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(MONGODB_MONGOS_KEY.to_string(), self.mongos_node_name().unwrap_or_default())])])
    }

    pub fn arbiter_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(MONGODB_NODE_TYPE_KEY.to_string(), MONGODB_NODE_TYPE_ARBITER.to_string())])])
    }

    pub fn hidden_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(MONGODB_NODE_TYPE_KEY.to_string(), MONGODB_NODE_TYPE_HIDDEN.to_string())])])
    }

    pub fn shard_labels(&self, index: i32) -> BTreeMap<String, String> {
        self.labels_from(self.shard_selectors(index), &BTreeMap::new())
    }

    pub fn config_svr_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.config_svr_selectors(), &BTreeMap::new())
    }

    pub fn mongos_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.mongos_selectors(), &BTreeMap::new())
    }

    /// Whether server certificates are issued once per workload: every shard
    /// and config server of a sharded cluster, or a replica set together with
    /// its arbiter.
    pub fn has_per_workload_server_cert(&self) -> bool {
        self.is_sharded() || (self.is_replica_set() && self.spec.arbiter.is_some())
    }

    /// Certificate name of an alias. Server certificates of sharded clusters
    /// are issued per workload, so they need the workload name.
    pub fn node_certificate_name(&self, alias: &str, petset: Option<&str>) -> Result<String> {
        let petset = petset.filter(|p| !p.is_empty());
        if alias != MONGODB_SERVER_CERT {
            return Ok(certificate_name(&self.offshoot_name(), alias));
        }
        if self.is_sharded() {
            let petset = petset.ok_or_else(|| {
                ApiError::MissingChildName(format!("server certificate of sharded {} needs a workload name", self.name_any()))
            })?;
            return Ok(certificate_name(petset, alias));
        }
        if self.is_replica_set() {
            return Ok(certificate_name(petset.unwrap_or(&self.offshoot_name()), alias));
        }
        Ok(certificate_name(&self.offshoot_name(), alias))
    }

    /// Secret holding the certificate of an alias for one workload. A sharded
    /// server certificate always follows the workload name; otherwise a secret
    /// name set by the user wins.
    pub fn node_cert_secret_name(&self, alias: &str, petset: Option<&str>) -> Result<String> {
        if alias == MONGODB_SERVER_CERT && self.is_sharded() {
            return self.node_certificate_name(alias, petset);
        }
        let user = self
            .spec
            .common
            .tls
            .as_ref()
            .and_then(|tls| get_certificate_secret_name(&tls.certificates, alias));
        match user {
            Some(name) => Ok(name.to_string()),
            None => self.node_certificate_name(alias, petset),
        }
    }

    /// Generated configuration secret of one node type, `None` for the main one.
    pub fn config_secret_name_for(&self, node_type: Option<&str>) -> String {
        self.config_secret_name(node_type)
    }
}

fn corresponding_replica_name(node: &str, node_type: &str) -> Result<String> {
    node.strip_suffix(&format!("-{}", node_type))
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidChildName {
            name: node.to_string(),
            reason: format!("expected a name ending with -{}", node_type),
        })
}

/// Client certificates must differ from the server ones in O or OU, so every
/// alias gets its own organizational unit. Fields the user set are kept one by
/// one, the rest of a partial subject is filled in.
fn merge_node_subject(certificates: &mut Vec<CertificateSpec>, alias: &str) {
    set_missing_spec_for_certificate(certificates, CertificateSpec { alias: alias.to_string(), ..Default::default() });
    let Some(cert) = certificates.iter_mut().find(|cert| cert.alias == alias) else { return };

    let subject = cert.subject.get_or_insert_with(X509Subject::default);
    if subject.organizations.is_empty() {
        subject.organizations = vec![KUBEDB_ORGANIZATION.to_string()];
    }
    if subject.organizational_units.is_empty() {
        subject.organizational_units = vec![alias.to_string()];
    }
}

fn node_role<'a>(name: &'static str, template: &'a mut PodTemplateSpec, coordinator: bool) -> RoleMut<'a> {
    RoleMut { name, replicas: None, suffix: None, pod_template: template, coordinator }
}

impl Database for MongoDB {
    fn descriptor(&self) -> &'static KindDescriptor {
        &MONGODB_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        if let Some(topology) = self.spec.shard_topology.as_ref() {
            return TopologyShape::Sharded {
                shards: topology.shard.shards,
                auxiliary: vec![MONGODB_NODE_TYPE_CONFIG.to_string(), MONGODB_NODE_TYPE_MONGOS.to_string()],
            };
        }
        if self.is_replica_set() {
            return TopologyShape::Replicated { replicas: self.spec.common.replicas.unwrap_or(1) };
        }
        TopologyShape::Standalone
    }

    /// The replication mode detector runs next to every replica set member.
    fn uses_coordinator(&self) -> bool {
        self.is_replica_set()
    }

    fn roles_mut(&mut self) -> Vec<RoleMut<'_>> {
        let spec = &mut self.spec;
        let mut roles = Vec::new();
        if let Some(topology) = spec.shard_topology.as_mut() {
            roles.push(node_role(MONGODB_NODE_TYPE_SHARD, &mut topology.shard.node.pod_template, true));
            roles.push(node_role(MONGODB_NODE_TYPE_CONFIG, &mut topology.config_server.pod_template, true));
            roles.push(node_role(MONGODB_NODE_TYPE_MONGOS, &mut topology.mongos.pod_template, false));
        }
        if let Some(arbiter) = spec.arbiter.as_mut() {
            roles.push(node_role(MONGODB_NODE_TYPE_ARBITER, &mut arbiter.pod_template, false));
        }
        if let Some(hidden) = spec.hidden.as_mut() {
            roles.push(node_role(MONGODB_NODE_TYPE_HIDDEN, &mut hidden.pod_template, false));
        }
        roles
    }

    fn apply_kind_defaults(&mut self, _entry: &VersionCatalogEntry) {
        let has_tls = self.spec.common.tls.is_some();
        let spec = &mut self.spec;

        spec.storage_engine.get_or_insert(StorageEngine::WiredTiger);
        let ssl_mode = *spec.ssl_mode.get_or_insert(if has_tls { SSLMode::RequireSSL } else { SSLMode::Disabled });

        if spec.replica_set.is_some() || spec.shard_topology.is_some() {
            spec.cluster_auth_mode.get_or_insert(match ssl_mode {
                SSLMode::Disabled | SSLMode::AllowSSL => ClusterAuthMode::KeyFile,
                SSLMode::PreferSSL | SSLMode::RequireSSL => ClusterAuthMode::X509,
            });
        }
    }

    fn apply_tls_defaults(&mut self, _entry: &VersionCatalogEntry) {
        let name = self.name_any();
        let per_workload_server_cert = self.has_per_workload_server_cert();

        let Some(tls) = self.spec.common.tls.as_mut() else { return };
        if tls.issuer_ref.is_none() {
            return;
        }

        for alias in [MONGODB_SERVER_CERT, MONGODB_CLIENT_CERT, MONGODB_METRICS_EXPORTER_CERT] {
            merge_node_subject(&mut tls.certificates, alias);
        }

        // A single secret name can not serve several workloads, so a server
        // secret name set by the user is dropped as well.
        if per_workload_server_cert {
            set_secret_name_for_certificate(&mut tls.certificates, MONGODB_SERVER_CERT, None);
        } else {
            set_missing_secret_name_for_certificate(
                &mut tls.certificates,
                MONGODB_SERVER_CERT,
                &certificate_name(&name, MONGODB_SERVER_CERT),
            );
        }
        for alias in [MONGODB_CLIENT_CERT, MONGODB_METRICS_EXPORTER_CERT] {
            set_missing_secret_name_for_certificate(&mut tls.certificates, alias, &certificate_name(&name, alias));
        }
    }

    fn workload_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        match self.spec.shard_topology.as_ref() {
            Some(topology) => {
                for i in 0..topology.shard.shards.max(0) {
                    names.extend(self.shard_node_name(i));
                    if self.spec.arbiter.is_some() {
                        names.extend(self.arbiter_shard_node_name(i));
                    }
                    if self.spec.hidden.is_some() {
                        names.extend(self.hidden_shard_node_name(i));
                    }
                }
                names.extend(self.config_svr_node_name());
                names.extend(self.mongos_node_name());
            },
            None => {
                names.push(self.offshoot_name());
                if self.spec.arbiter.is_some() {
                    names.push(self.arbiter_node_name());
                }
                if self.spec.hidden.is_some() {
                    names.push(self.hidden_node_name());
                }
            },
        }
        names
    }

    fn expected_workloads(&self) -> usize {
        let mut expected = self.topology().workload_count();
        if self.spec.arbiter.is_some() {
            expected += 1;
        }
        if self.spec.hidden.is_some() {
            expected += 1;
        }
        expected
    }

    fn extra_persistent_secrets(&self) -> Vec<String> {
        self.spec.key_file_secret.iter().map(|s| s.name.clone()).collect()
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let spec = &self.spec;
        let durable = spec.common.storage_type == Some(StorageType::Durable);

        if spec.replica_set.is_some() && spec.shard_topology.is_some() {
            errors.forbidden(spec_path().child("shardTopology"), "replicaSet and shardTopology can not be set together");
        }
        if let Some(rs) = spec.replica_set.as_ref().filter(|rs| rs.name.is_empty()) {
            errors.invalid(spec_path().child("replicaSet").child("name"), &rs.name, "replica set name can not be empty");
        }

        if let Some(topology) = spec.shard_topology.as_ref() {
            let path = spec_path().child("shardTopology");
            if topology.shard.shards < 1 {
                errors.invalid(path.child("shard").child("shards"), topology.shard.shards, "number of shards must be at least 1");
            }
            let nodes = [
                ("shard", &topology.shard.node),
                ("configServer", &topology.config_server),
                ("mongos", &topology.mongos),
            ];
            for (field, node) in nodes {
                if node.replicas < 1 {
                    errors.invalid(path.child(field).child("replicas"), node.replicas, "replicas must be at least 1");
                }
            }
            for (field, node) in [("shard", &topology.shard.node), ("configServer", &topology.config_server)] {
                if durable && node.storage.is_none() {
                    errors.required(path.child(field).child("storage"), "durable shards keep their data in spec storage");
                }
            }
            if topology.mongos.storage.is_some() {
                errors.forbidden(path.child("mongos").child("storage"), "mongos routers keep no data");
            }
        }

        let clustered = spec.replica_set.is_some() || spec.shard_topology.is_some();
        if spec.arbiter.is_some() && !clustered {
            errors.forbidden(spec_path().child("arbiter"), "an arbiter needs a replica set or shards");
        }
        if let Some(hidden) = spec.hidden.as_ref() {
            let path = spec_path().child("hidden");
            if !clustered {
                errors.forbidden(path.clone(), "hidden members need a replica set or shards");
            }
            if hidden.replicas < 1 {
                errors.invalid(path.child("replicas"), hidden.replicas, "replicas must be at least 1");
            }
            if durable && hidden.storage.is_none() {
                errors.required(path.child("storage"), "durable hidden members need storage");
            }
        }

        if spec.common.tls.is_none() && matches!(spec.ssl_mode, Some(SSLMode::PreferSSL | SSLMode::RequireSSL)) {
            errors.invalid(spec_path().child("sslMode"), format!("{:?}", spec.ssl_mode), "sslMode needs spec.tls to be set");
        }
    }
}
