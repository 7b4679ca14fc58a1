// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_DATABASE, REDIS_CONTAINER_NAME, REDIS_COORDINATOR_CONTAINER_NAME, REDIS_DATABASE_PORT, REDIS_DEFAULT_SHARDS,
    REDIS_DEFAULT_SHARD_REPLICAS, REDIS_INIT_CONTAINER_NAME, REDIS_SHARD_KEY, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static REDIS_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "Redis",
    plural: "redises",
    singular: "redis",
    short_code: "rd",
    container: REDIS_CONTAINER_NAME,
    init_container: Some(REDIS_INIT_CONTAINER_NAME),
    coordinator_container: Some(REDIS_COORDINATOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Redis",
    group = "kubedb.com",
    version = "v1",
    plural = "redises",
    shortname = "rd",
    status = "DatabaseStatus",
    doc = "Redis is a specification for a Redis server, sentinel-monitored group or cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RedisSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RedisMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Sentinel that monitors the servers in Sentinel mode
    pub sentinel_ref: Option<RedisSentinelRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<RedisClusterSpec>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_auth: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum RedisMode {
    Standalone,
    Cluster,
    Sentinel,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RedisClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Number of shards, at least 3
    pub shards: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Replicas per shard besides the master
    pub replicas: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RedisSentinelRef {
    pub name: String,
    pub namespace: String,
}

impl Redis {
    pub fn mode(&self) -> RedisMode {
        self.spec.mode.unwrap_or(RedisMode::Standalone)
    }

    pub fn is_cluster(&self) -> bool {
        self.mode() == RedisMode::Cluster
    }

    pub fn shards(&self) -> i32 {
        self.spec
            .cluster
            .as_ref()
            .and_then(|c| c.shards)
            .unwrap_or(REDIS_DEFAULT_SHARDS)
    }

    pub fn base_name_for_shard(&self) -> String {
        name_with_suffix(&self.offshoot_name(), "shard")
    }

    /// Workload name of shard `index`, e.g. `rd-shard0`.
    pub fn petset_name_with_shard(&self, index: i32) -> String {
        format!("{}{}", self.base_name_for_shard(), index)
    }

    pub fn shard_selectors(&self, index: i32) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(REDIS_SHARD_KEY.to_string(), index.to_string())])])
    }

    pub fn custom_config_secret_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), "custom-config")
    }

    pub fn address(&self) -> String {
        format!("{}.{}.svc:{}", self.offshoot_name(), self.namespace_or_default(), REDIS_DATABASE_PORT)
    }
}

impl Database for Redis {
    fn descriptor(&self) -> &'static KindDescriptor {
        &REDIS_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        if self.is_cluster() {
            return TopologyShape::Sharded { shards: self.shards(), auxiliary: Vec::new() };
        }
        TopologyShape::from_replicas(self.spec.common.replicas)
    }

    fn uses_coordinator(&self) -> bool {
        self.mode() == RedisMode::Sentinel
    }

    /// Every shard is built from `spec.podTemplate`.
    fn uses_main_pod_template(&self) -> bool {
        true
    }

    fn workload_names(&self) -> Vec<String> {
        if self.is_cluster() {
            return (0..self.shards().max(0)).map(|i| self.petset_name_with_shard(i)).collect();
        }
        vec![self.offshoot_name()]
    }

    fn apply_kind_defaults(&mut self, _entry: &VersionCatalogEntry) {
        let mode = *self.spec.mode.get_or_insert(RedisMode::Standalone);
        if mode == RedisMode::Cluster {
            let cluster = self.spec.cluster.get_or_insert_with(RedisClusterSpec::default);
            cluster.shards.get_or_insert(REDIS_DEFAULT_SHARDS);
            cluster.replicas.get_or_insert(REDIS_DEFAULT_SHARD_REPLICAS);
        }
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let cluster_path = spec_path().child("cluster");

        if let Some(cluster) = self.spec.cluster.as_ref().filter(|_| self.is_cluster()) {
            if let Some(shards) = cluster.shards.filter(|s| *s < 3) {
                errors.invalid(cluster_path.child("shards"), shards, "number of shards can not be less than 3");
            }
            if let Some(replicas) = cluster.replicas.filter(|r| *r < 0) {
                errors.invalid(cluster_path.child("replicas"), replicas, "number of replicas can not be negative");
            }
        } else if self.spec.cluster.is_some() {
            errors.forbidden(cluster_path, "spec.cluster is only used in Cluster mode");
        }

        if self.mode() != RedisMode::Sentinel && self.spec.sentinel_ref.is_some() {
            errors.forbidden(spec_path().child("sentinelRef"), "spec.sentinelRef is only used in Sentinel mode");
        }
    }
}
