// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::EnvVar;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_DATABASE, GROUP_NAME, KAFKA_CLUSTER_ID_ENV, KAFKA_CONTAINER_NAME, KAFKA_CRUISE_CONTROL, KAFKA_NODE_ROLE_BROKER,
    KAFKA_NODE_ROLE_CONTROLLER, KAFKA_NODE_ROLE_SET, KAFKA_RESERVED_MOUNT_PATHS, KAFKA_RESERVED_VOLUMES,
    ResourceProfile,
};
use crate::crd::{Database, common::{
    DatabaseCommonSpec, DatabaseStatus, PodTemplateSpec, RoleSpec, SecretReference, StorageType,
}};
use crate::crd::kind::{KindDescriptor, RoleMut, RoleRef, TopologyShape};
use crate::defaults::{default_pod_template, ensure_container};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::tls;
use crate::validation::{FieldErrorList, FieldPath, spec_path};

pub const KAFKA_SERVER_CERT: &str = "server";
pub const KAFKA_CLIENT_CERT: &str = "client";

pub static KAFKA_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "Kafka",
    plural: "kafkas",
    singular: "kafka",
    short_code: "kf",
    container: KAFKA_CONTAINER_NAME,
    init_container: None,
    coordinator_container: None,
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &[KAFKA_SERVER_CERT, KAFKA_CLIENT_CERT],
    failure_threshold: 3,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Kafka",
    group = "kubedb.com",
    version = "v1",
    plural = "kafkas",
    shortname = "kf",
    status = "DatabaseStatus",
    doc = "Kafka is a specification for a KRaft based Kafka cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Dedicated controller and broker nodes. Without it every node runs both roles.
    pub topology: Option<KafkaClusterTopology>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[serde(rename = "enableSSL")]
    pub enable_ssl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystore_cred_secret: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cruise_control: Option<KafkaCruiseControl>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KafkaClusterTopology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<RoleSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker: Option<RoleSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KafkaCruiseControl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub pod_template: PodTemplateSpec,
}

/// Value of `KAFKA_CLUSTER_ID` set on the kafka container of a template.
pub fn cluster_id(template: &PodTemplateSpec) -> Option<&str> {
    template
        .spec
        .containers
        .iter()
        .find(|c| c.name == KAFKA_CONTAINER_NAME)?
        .env
        .as_ref()?
        .iter()
        .find(|e| e.name == KAFKA_CLUSTER_ID_ENV)?
        .value
        .as_deref()
}

fn set_cluster_id_env(template: &mut PodTemplateSpec, id: &str) {
    let container = ensure_container(&mut template.spec.containers, KAFKA_CONTAINER_NAME);
    let env = container.env.get_or_insert_with(Vec::new);
    if !env.iter().any(|e| e.name == KAFKA_CLUSTER_ID_ENV) {
        env.push(EnvVar {
            name: KAFKA_CLUSTER_ID_ENV.to_string(),
            value: Some(id.to_string()),
            ..Default::default()
        });
    }
}

/// A KRaft cluster id: the last three groups of a random uuid with the final
/// character replaced by `w`.
pub fn generate_cluster_id() -> String {
    let uuid = Uuid::new_v4().to_string();
    let mut id = uuid.split('-').skip(2).collect::<Vec<_>>().join("-");
    id.pop();
    id.push('w');
    id
}

impl Kafka {
    pub fn is_topology_mode(&self) -> bool {
        self.spec.topology.is_some()
    }

    fn role_petset_name(&self, role: Option<&RoleSpec>, default_suffix: &str) -> String {
        let suffix = role
            .and_then(|r| r.suffix.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(default_suffix);
        name_with_suffix(&self.offshoot_name(), suffix)
    }

    pub fn controller_petset_name(&self) -> String {
        let controller = self.spec.topology.as_ref().and_then(|t| t.controller.as_ref());
        self.role_petset_name(controller, KAFKA_NODE_ROLE_CONTROLLER)
    }

    pub fn broker_petset_name(&self) -> String {
        let broker = self.spec.topology.as_ref().and_then(|t| t.broker.as_ref());
        self.role_petset_name(broker, KAFKA_NODE_ROLE_BROKER)
    }

    /// Label key marking pods of a node role, e.g. `kubedb.com/role-broker`.
    pub fn node_role_label_key(&self, role: &str) -> String {
        format!("{}/role-{}", GROUP_NAME, role)
    }

    pub fn controller_node_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(
            self.node_role_label_key(KAFKA_NODE_ROLE_CONTROLLER),
            KAFKA_NODE_ROLE_SET.to_string(),
        )])])
    }

    pub fn broker_node_selectors(&self) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(
            self.node_role_label_key(KAFKA_NODE_ROLE_BROKER),
            KAFKA_NODE_ROLE_SET.to_string(),
        )])])
    }

    pub fn controller_service_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.controller_node_selectors(), &BTreeMap::new())
    }

    pub fn broker_service_labels(&self) -> BTreeMap<String, String> {
        self.labels_from(self.broker_node_selectors(), &BTreeMap::new())
    }

    pub fn keystore_secret_name(&self) -> String {
        match self.spec.keystore_cred_secret.as_ref() {
            Some(secret) if !secret.name.is_empty() => secret.name.clone(),
            _ => name_with_suffix(&self.offshoot_name(), "keystore-cred"),
        }
    }

    pub fn cruise_control_config_secret_name(&self) -> String {
        self.config_secret_name(Some(KAFKA_CRUISE_CONTROL))
    }

    pub fn governing_service_name_cruise_control(&self) -> String {
        name_with_suffix(&self.service_name(), KAFKA_CRUISE_CONTROL)
    }

    pub fn cruise_control_client_id(&self) -> String {
        name_with_suffix(&self.name_any(), KAFKA_CRUISE_CONTROL)
    }

    pub fn cert_secret_volume_name(alias: &str) -> String {
        format!("{}-certs", alias)
    }

    pub fn connection_scheme(&self) -> &'static str {
        if self.spec.enable_ssl { "https" } else { "http" }
    }

    /// Templates whose kafka container carries `KAFKA_CLUSTER_ID`.
    fn node_templates(&self) -> Vec<&PodTemplateSpec> {
        match self.spec.topology.as_ref() {
            Some(topology) => [topology.controller.as_ref(), topology.broker.as_ref()]
                .into_iter()
                .flatten()
                .map(|role| &role.pod_template)
                .collect(),
            None => vec![&self.spec.common.pod_template],
        }
    }

    fn node_templates_mut(&mut self) -> Vec<&mut PodTemplateSpec> {
        let spec = &mut self.spec;
        match spec.topology.as_mut() {
            Some(topology) => [topology.controller.as_mut(), topology.broker.as_mut()]
                .into_iter()
                .flatten()
                .map(|role| &mut role.pod_template)
                .collect(),
            None => vec![&mut spec.common.pod_template],
        }
    }

    /// The cluster id already set on any node, reused so that every role
    /// joins the same cluster.
    pub fn existing_cluster_id(&self) -> Option<String> {
        self.node_templates().into_iter().find_map(cluster_id).map(str::to_string)
    }

    fn set_default_envs(&mut self) {
        let id = self.existing_cluster_id().unwrap_or_else(generate_cluster_id);
        for template in self.node_templates_mut() {
            set_cluster_id_env(template, &id);
        }
    }

    fn validate_cluster_id(topology: &KafkaClusterTopology, path: FieldPath, errors: &mut FieldErrorList) {
        let controller = topology.controller.as_ref().and_then(|r| cluster_id(&r.pod_template));
        let broker = topology.broker.as_ref().and_then(|r| cluster_id(&r.pod_template));
        match (controller, broker) {
            (None, None) => {},
            (Some(c), Some(b)) if c == b => {},
            _ => errors.invalid(
                path,
                format!("{:?}/{:?}", controller, broker),
                "broker and controller env KAFKA_CLUSTER_ID must have the same cluster id",
            ),
        }
    }

    fn validate_pod_template(&self, template: &PodTemplateSpec, path: FieldPath, errors: &mut FieldErrorList) {
        let mut reserved: Vec<String> = KAFKA_RESERVED_VOLUMES.iter().map(|v| v.to_string()).collect();
        if let Some(tls) = self.spec.common.tls.as_ref() {
            reserved.extend(tls.certificates.iter().map(|c| Kafka::cert_secret_volume_name(&c.alias)));
        }
        for volume in template.spec.volumes.iter().filter(|v| reserved.contains(&v.name)) {
            errors.invalid(path.child("spec").child("volumes"), &volume.name, "can not use a reserved volume name");
        }

        let containers = template.spec.containers.iter().chain(template.spec.init_containers.iter());
        for container in containers {
            let mounts = container.volume_mounts.iter().flatten();
            for mount in mounts.filter(|m| KAFKA_RESERVED_MOUNT_PATHS.contains(&m.mount_path.as_str())) {
                errors.invalid(
                    path.child("spec").child("volumeMounts"),
                    &mount.mount_path,
                    "can not use a reserved volume mount path",
                );
            }
        }
    }
}

impl Database for Kafka {
    fn descriptor(&self) -> &'static KindDescriptor {
        &KAFKA_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        if self.is_topology_mode() {
            return TopologyShape::Clustered {
                roles: vec![KAFKA_NODE_ROLE_CONTROLLER.to_string(), KAFKA_NODE_ROLE_BROKER.to_string()],
            };
        }
        TopologyShape::from_replicas(self.spec.common.replicas)
    }

    fn roles(&self) -> Vec<RoleRef<'_>> {
        let Some(topology) = self.spec.topology.as_ref() else { return Vec::new() };
        let mut roles = Vec::new();
        if let Some(controller) = topology.controller.as_ref() {
            roles.push(controller.role_ref(KAFKA_NODE_ROLE_CONTROLLER));
        }
        if let Some(broker) = topology.broker.as_ref() {
            roles.push(broker.role_ref(KAFKA_NODE_ROLE_BROKER));
        }
        roles
    }

    fn roles_mut(&mut self) -> Vec<RoleMut<'_>> {
        let Some(topology) = self.spec.topology.as_mut() else { return Vec::new() };
        let mut roles = Vec::new();
        if let Some(controller) = topology.controller.as_mut() {
            roles.push(controller.role_mut(KAFKA_NODE_ROLE_CONTROLLER));
        }
        if let Some(broker) = topology.broker.as_mut() {
            roles.push(broker.role_mut(KAFKA_NODE_ROLE_BROKER));
        }
        roles
    }

    fn apply_kind_defaults(&mut self, entry: &VersionCatalogEntry) {
        let name = self.name_any();
        if let Some(cruise_control) = self.spec.cruise_control.as_mut() {
            cruise_control.replicas.get_or_insert(1);
            default_pod_template(&mut cruise_control.pod_template, entry, &KAFKA_DESCRIPTOR, &name, false);
        }
        self.set_default_envs();
    }

    fn apply_tls_defaults(&mut self, _entry: &VersionCatalogEntry) {
        if self.spec.enable_ssl {
            tls::set_default_certificates(self);
        }
    }

    fn expected_workloads(&self) -> usize {
        if self.is_topology_mode() { 2 } else { 1 }
    }

    fn extra_persistent_secrets(&self) -> Vec<String> {
        self.spec.keystore_cred_secret.iter().map(|s| s.name.clone()).collect()
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let spec = &self.spec;

        if spec.enable_ssl && spec.common.tls.is_none() {
            errors.invalid(spec_path().child("enableSSL"), true, "spec.tls can't be empty when spec.enableSSL is true");
        } else if !spec.enable_ssl && spec.common.tls.is_some() {
            errors.invalid(spec_path().child("enableSSL"), false, "spec.tls must be empty when spec.enableSSL is false");
        }

        self.validate_pod_template(&spec.common.pod_template, spec_path().child("podTemplate"), errors);

        let Some(topology) = spec.topology.as_ref() else { return };
        let path = spec_path().child("topology");

        if topology.controller.is_none() {
            errors.required(path.child(KAFKA_NODE_ROLE_CONTROLLER), "the controller node is required in topology mode");
        }
        if topology.broker.is_none() {
            errors.required(path.child(KAFKA_NODE_ROLE_BROKER), "the broker node is required in topology mode");
        }
        if spec.common.storage.is_some() {
            errors.forbidden(spec_path().child("storage"), "use the storage of each node when spec.topology is set");
        }
        if spec.common.pod_template.spec.containers.iter().any(|c| c.resources.is_some()) {
            errors.forbidden(
                spec_path().child("podTemplate").child("spec").child("resources"),
                "use the pod template of each node when spec.topology is set",
            );
        }

        let mut suffixes = BTreeSet::new();
        for role in self.roles() {
            let role_path = path.child(role.name);
            if let Some(replicas) = role.replicas.filter(|r| *r <= 0) {
                errors.invalid(role_path.child("replicas"), replicas, "replicas of a node must be at least 1");
            }
            if !suffixes.insert(role.effective_suffix().to_string()) {
                errors.invalid(role_path.child("suffix"), role.effective_suffix(), "two nodes can not have the same suffix");
            }
            if spec.common.storage_type == Some(StorageType::Durable) && role.storage.is_none() {
                errors.required(role_path.child("storage"), "durable nodes need storage");
            }
            self.validate_pod_template(role.pod_template, role_path.child("podTemplate"), errors);
        }

        Kafka::validate_cluster_id(topology, path, errors);
    }
}
