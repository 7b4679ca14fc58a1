// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPONENT_DATABASE, REDIS_SENTINEL_CONTAINER_NAME, REDIS_SENTINEL_INIT_CONTAINER_NAME, REDIS_SENTINEL_PORT,
    ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static REDIS_SENTINEL_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "RedisSentinel",
    plural: "redissentinels",
    singular: "redissentinel",
    short_code: "rds",
    container: REDIS_SENTINEL_CONTAINER_NAME,
    init_container: Some(REDIS_SENTINEL_INIT_CONTAINER_NAME),
    coordinator_container: None,
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "RedisSentinel",
    group = "kubedb.com",
    version = "v1",
    plural = "redissentinels",
    shortname = "rds",
    status = "DatabaseStatus",
    doc = "RedisSentinel is a specification for a set of Redis Sentinels watching Redis servers managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RedisSentinelSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_auth: bool,
}

impl RedisSentinel {
    pub fn address(&self) -> String {
        format!("{}.{}.svc:{}", self.service_name(), self.namespace_or_default(), REDIS_SENTINEL_PORT)
    }

    /// The sentinel configuration is stored under the plain database name.
    pub fn sentinel_config_secret_name(&self) -> String {
        self.offshoot_name()
    }
}

impl Database for RedisSentinel {
    fn descriptor(&self) -> &'static KindDescriptor {
        &REDIS_SENTINEL_DESCRIPTOR
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

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        if self.spec.disable_auth && self.spec.common.auth_secret.is_some() {
            errors.forbidden(spec_path().child("authSecret"), "authSecret can not be set while disableAuth is true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::{SecretReference, StorageType};
    use crate::crd::v1::testing::entry;
    use crate::defaults::apply_defaults;

    fn sentinel() -> RedisSentinel {
        let mut db = RedisSentinel::new("sen", RedisSentinelSpec {
            common: DatabaseCommonSpec { version: "7.2.3".to_string(), replicas: Some(3), ..Default::default() },
            ..Default::default()
        });
        db.metadata.namespace = Some("demo".to_string());
        db
    }

    #[test]
    fn test_defaults() {
        let mut db = sentinel();

        apply_defaults(&mut db, &entry("7.2.3", 999)).unwrap();

        let spec = &db.spec.common.pod_template.spec;
        assert_eq!(db.spec.common.storage_type, Some(StorageType::Durable));
        assert_eq!(spec.containers[0].name, "redissentinel");
        assert_eq!(spec.init_containers[0].name, "sentinel-init");
        assert_eq!(spec.init_containers[0].resources, Some(ResourceProfile::InitContainer.requirements()));
        assert_eq!(spec.service_account_name.as_deref(), Some("sen"));
    }

    #[test]
    fn test_names() {
        let db = sentinel();

        assert_eq!(db.address(), "sen.demo.svc:26379");
        assert_eq!(db.sentinel_config_secret_name(), "sen");
        assert_eq!(db.governing_service_name(), "sen-pods");
        assert_eq!(db.resource_fqn(), "redissentinels.kubedb.com");
    }

    #[test]
    fn test_disable_auth_forbids_auth_secret() {
        let mut db = sentinel();
        db.spec.disable_auth = true;
        db.spec.common.auth_secret = Some(SecretReference { name: "creds".to_string(), ..Default::default() });
        let mut errors = FieldErrorList::default();

        db.validate_kind(&mut errors);

        assert!(errors.has_path("spec.authSecret"));
    }
}
