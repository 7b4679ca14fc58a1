pub mod any;
pub mod common;
pub mod kind;
pub mod v1;

use kube::{Resource, ResourceExt, CustomResourceExt, core::object::{HasStatus, HasSpec}};
use k8s_openapi::NamespaceResourceScope;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::BTreeMap, fmt::Debug};

use crate::catalog::VersionCatalogEntry;
use crate::crd::common::DatabaseCommonSpec;
use crate::crd::kind::{KindDescriptor, RoleMut, RoleRef, TopologyShape};
use crate::meta::name_with_suffix;
use crate::tls;
use crate::validation::FieldErrorList;

pub trait NamespacedCustomResource:
    Clone
        + Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + CustomResourceExt
        + HasStatus
        + HasSpec
        + JsonSchema
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static
{}

impl<T> NamespacedCustomResource for T
where
    T: Clone
        + Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + CustomResourceExt
        + HasStatus
        + HasSpec
        + JsonSchema
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static
{}

/// A KubeDB database kind. The defaulter, the name deriver, the readiness
/// checker and the validator are written once against this trait; kinds only
/// describe where their fields live and what differs from the common rules.
pub trait Database: NamespacedCustomResource {
    fn descriptor(&self) -> &'static KindDescriptor;

    fn common(&self) -> &DatabaseCommonSpec;

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec;

    fn topology(&self) -> TopologyShape;

    /// Replica count applied when `spec.replicas` is unset.
    fn default_replicas(&self) -> i32 {
        1
    }

    /// Whether the pods built from `spec.podTemplate` run the coordinator sidecar.
    fn uses_coordinator(&self) -> bool {
        false
    }

    /// Selector entries added to the common offshoot selectors.
    fn kind_selectors(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Whether `spec.podTemplate` is what the workloads are built from.
    fn uses_main_pod_template(&self) -> bool {
        !self.topology().is_divided()
    }

    /// Whether the kind keeps data on volumes at all. Proxies and poolers
    /// do not, and carry neither `storageType` nor `storage`.
    fn has_storage(&self) -> bool {
        true
    }

    /// Whether a `Durable` database must carry `spec.storage`.
    fn requires_storage(&self) -> bool {
        self.has_storage() && self.uses_main_pod_template()
    }

    /// Whether listing certificates without an issuer is rejected.
    fn requires_tls_issuer(&self) -> bool {
        true
    }

    fn roles(&self) -> Vec<RoleRef<'_>> {
        Vec::new()
    }

    fn roles_mut(&mut self) -> Vec<RoleMut<'_>> {
        Vec::new()
    }

    /// Kind specific defaults, run before the common rules.
    fn apply_kind_defaults(&mut self, _entry: &VersionCatalogEntry) {}

    fn apply_tls_defaults(&mut self, _entry: &VersionCatalogEntry) {
        tls::set_default_certificates(self);
    }

    /// Names of the workloads the database is made of.
    fn workload_names(&self) -> Vec<String> {
        let name = self.name_any();
        let roles = self.roles();
        if roles.is_empty() {
            return vec![name];
        }
        roles.iter().map(|role| name_with_suffix(&name, role.effective_suffix())).collect()
    }

    /// Number of workloads a fully provisioned database owns.
    fn expected_workloads(&self) -> usize {
        self.topology().workload_count()
    }

    fn extra_persistent_secrets(&self) -> Vec<String> {
        Vec::new()
    }

    fn validate_kind(&self, _errors: &mut FieldErrorList) {}
}
