// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::TypedLocalObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{COMPONENT_DATABASE, PROXYSQL_ADMIN_PORT, PROXYSQL_CONTAINER_NAME, PROXYSQL_DATABASE_PORT, ResourceProfile};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static PROXYSQL_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "ProxySQL",
    plural: "proxysqls",
    singular: "proxysql",
    short_code: "prx",
    container: PROXYSQL_CONTAINER_NAME,
    init_container: None,
    coordinator_container: None,
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "ProxySQL",
    group = "kubedb.com",
    version = "v1",
    plural = "proxysqls",
    shortname = "prx",
    status = "DatabaseStatus",
    doc = "ProxySQL is a specification for a ProxySQL load balancer in front of a MySQL compatible backend.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProxySQLSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// The MySQL, MariaDB or PerconaXtraDB the proxy balances
    pub backend: Option<TypedLocalObjectReference>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    /// Copy the backend users into the proxy
    pub sync_users: bool,
}

const BACKEND_KINDS: &[&str] = &["MySQL", "MariaDB", "PerconaXtraDB"];

impl ProxySQL {
    pub fn is_cluster(&self) -> bool {
        self.spec.common.replicas.unwrap_or(1) > 1
    }

    pub fn address(&self) -> String {
        format!("{}.{}.svc:{}", self.service_name(), self.namespace_or_default(), PROXYSQL_DATABASE_PORT)
    }

    pub fn admin_address(&self) -> String {
        format!("{}.{}.svc:{}", self.service_name(), self.namespace_or_default(), PROXYSQL_ADMIN_PORT)
    }
}

impl Database for ProxySQL {
    fn descriptor(&self) -> &'static KindDescriptor {
        &PROXYSQL_DESCRIPTOR
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

    fn has_storage(&self) -> bool {
        false
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let path = spec_path().child("backend");
        match self.spec.backend.as_ref() {
            None => errors.required(path, "a proxy needs a backend to balance"),
            Some(backend) => {
                if backend.name.is_empty() {
                    errors.required(path.child("name"), "backend name can not be empty");
                }
                if !BACKEND_KINDS.contains(&backend.kind.as_str()) {
                    errors.invalid(path.child("kind"), &backend.kind, "backend must be a MySQL, MariaDB or PerconaXtraDB");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::TlsConfig;
    use crate::crd::v1::testing::{catalog, entry, issuer};
    use crate::defaults::set_defaults;
    use crate::validation::validate_create_or_update;

    fn backend(kind: &str) -> TypedLocalObjectReference {
        TypedLocalObjectReference {
            api_group: Some("kubedb.com".to_string()),
            kind: kind.to_string(),
            name: "mysql-server".to_string(),
        }
    }

    fn proxysql() -> ProxySQL {
        let mut db = ProxySQL::new("proxy", ProxySQLSpec {
            common: DatabaseCommonSpec { version: "2.4.4-debian".to_string(), ..Default::default() },
            backend: Some(backend("MySQL")),
            ..Default::default()
        });
        db.metadata.namespace = Some("demo".to_string());
        db
    }

    #[test]
    fn test_defaults() {
        let mut db = proxysql();
        db.spec.common.tls = Some(TlsConfig { issuer_ref: Some(issuer()), ..Default::default() });
        let catalog = catalog(vec![entry("2.4.4-debian", 999)]);

        set_defaults(&mut db, &catalog).unwrap();

        assert_eq!(db.spec.common.replicas, Some(1));
        assert_eq!(db.spec.common.storage_type, None);
        let container = &db.spec.common.pod_template.spec.containers[0];
        assert_eq!(container.name, "proxysql");
        assert_eq!(container.security_context.as_ref().unwrap().run_as_group, Some(999));
        assert_eq!(db.cert_secret_name("server"), "proxy-server-cert");
        assert!(validate_create_or_update(&db, &catalog).is_ok());
    }

    #[test]
    fn test_addresses() {
        let db = proxysql();

        assert!(!db.is_cluster());
        assert_eq!(db.address(), "proxy.demo.svc:6033");
        assert_eq!(db.admin_address(), "proxy.demo.svc:6032");
    }

    #[test]
    fn test_backend_is_required() {
        let mut db = proxysql();
        db.spec.backend = None;
        let mut errors = FieldErrorList::default();
        db.validate_kind(&mut errors);
        assert!(errors.has_path("spec.backend"));

        db.spec.backend = Some(backend("Postgres"));
        let mut errors = FieldErrorList::default();
        db.validate_kind(&mut errors);
        assert!(errors.has_path("spec.backend.kind"));
    }
}
