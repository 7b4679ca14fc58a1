// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::VolumeSource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{COMPONENT_DATABASE, MEMCACHED_CONTAINER_NAME, MEMCACHED_DATABASE_PORT, ResourceProfile};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static MEMCACHED_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "Memcached",
    plural: "memcacheds",
    singular: "memcached",
    short_code: "mc",
    container: MEMCACHED_CONTAINER_NAME,
    init_container: None,
    coordinator_container: None,
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Memcached",
    group = "kubedb.com",
    version = "v1",
    plural = "memcacheds",
    shortname = "mc",
    status = "DatabaseStatus",
    doc = "Memcached is a specification for a Memcached server managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MemcachedSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional volume mounted at `/data`, meant for persistent memory
    pub data_volume: Option<VolumeSource>,
}

impl Memcached {
    pub fn custom_config_secret_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), "custom-config")
    }

    pub fn address(&self) -> String {
        format!("{}.{}.svc:{}", self.service_name(), self.namespace_or_default(), MEMCACHED_DATABASE_PORT)
    }
}

impl Database for Memcached {
    fn descriptor(&self) -> &'static KindDescriptor {
        &MEMCACHED_DESCRIPTOR
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

    /// Data lives in memory, `dataVolume` is the only disk a server gets.
    fn requires_storage(&self) -> bool {
        false
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        if self.spec.common.storage.is_some() {
            errors.forbidden(spec_path().child("storage"), "memcached keeps its data in memory, use spec.dataVolume");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::v1::testing::{catalog, entry};
    use crate::defaults::set_defaults;
    use crate::validation::validate_create_or_update;

    fn memcached() -> Memcached {
        let mut db = Memcached::new("mc", MemcachedSpec {
            common: DatabaseCommonSpec { version: "1.6.22".to_string(), ..Default::default() },
            ..Default::default()
        });
        db.metadata.namespace = Some("cache".to_string());
        db
    }

    #[test]
    fn test_defaults_without_init_container() {
        let mut db = memcached();

        set_defaults(&mut db, &catalog(vec![entry("1.6.22", 999)])).unwrap();

        let spec = &db.spec.common.pod_template.spec;
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.containers[0].name, "memcached");
        assert!(spec.init_containers.is_empty());
    }

    #[test]
    fn test_durable_without_storage_is_valid() {
        let mut db = memcached();
        let catalog = catalog(vec![entry("1.6.22", 999)]);

        set_defaults(&mut db, &catalog).unwrap();

        assert!(validate_create_or_update(&db, &catalog).is_ok());
    }

    #[test]
    fn test_address() {
        assert_eq!(memcached().address(), "mc.cache.svc:11211");
        assert_eq!(memcached().custom_config_secret_name(), "mc-custom-config");
    }
}
