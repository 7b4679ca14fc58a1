// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_CONNECTION_POOLER, PGBOUNCER_CONTAINER_NAME, PGBOUNCER_DATABASE_PORT, PGBOUNCER_DEFAULT_IGNORE_STARTUP_PARAMETERS,
    PGBOUNCER_DEFAULT_POOL_MODE, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::validation::{FieldErrorList, spec_path};

pub static PGBOUNCER_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "PgBouncer",
    plural: "pgbouncers",
    singular: "pgbouncer",
    short_code: "pb",
    container: PGBOUNCER_CONTAINER_NAME,
    init_container: None,
    coordinator_container: None,
    component: COMPONENT_CONNECTION_POOLER,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "PgBouncer",
    group = "kubedb.com",
    version = "v1",
    plural = "pgbouncers",
    shortname = "pb",
    status = "DatabaseStatus",
    doc = "PgBouncer is a specification for a PgBouncer connection pooler in front of a Postgres database.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PgBouncerSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    /// The Postgres database the pooler serves
    #[serde(default)]
    pub database: PgBouncerDatabaseRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPoolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<PgBouncerSSLMode>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PgBouncerDatabaseRef {
    /// Fetch the backend users from their externally managed secrets
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sync_users: bool,
    /// AppBinding of the backend, in any namespace
    pub database_ref: AppReference,
    /// Database inside the Postgres instance
    pub database_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AppReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionPoolConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// `session`, `transaction` or `statement`
    pub pool_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_client_connections: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pool_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pool_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_pool_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_pool_timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxDBConnections")]
    pub max_db_connections: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_connections: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_period_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<PgBouncerClientAuthMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_startup_parameters: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum PgBouncerSSLMode {
    #[serde(rename = "disable")]
    Disable,
    #[serde(rename = "allow")]
    Allow,
    #[serde(rename = "prefer")]
    Prefer,
    #[serde(rename = "require")]
    Require,
    #[serde(rename = "verify-ca")]
    VerifyCA,
    #[serde(rename = "verify-full")]
    VerifyFull,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum PgBouncerClientAuthMode {
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "scram-sha-256")]
    Scram,
    #[serde(rename = "cert")]
    Cert,
}

impl PgBouncerSSLMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PgBouncerSSLMode::Disable => "disable",
            PgBouncerSSLMode::Allow => "allow",
            PgBouncerSSLMode::Prefer => "prefer",
            PgBouncerSSLMode::Require => "require",
            PgBouncerSSLMode::VerifyCA => "verify-ca",
            PgBouncerSSLMode::VerifyFull => "verify-full",
        }
    }
}

impl PgBouncer {
    /// Secret the operator keeps the backend users in.
    pub fn backend_secret_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), "backend")
    }

    pub fn final_config_secret_name(&self) -> String {
        name_with_suffix(&self.service_name(), "final-config")
    }

    pub fn replicas_service_name(&self) -> String {
        name_with_suffix(&self.offshoot_name(), "replicas")
    }

    pub fn port(&self) -> i32 {
        self.spec.connection_pool.as_ref().and_then(|pool| pool.port).unwrap_or(PGBOUNCER_DATABASE_PORT)
    }
}

impl Database for PgBouncer {
    fn descriptor(&self) -> &'static KindDescriptor {
        &PGBOUNCER_DESCRIPTOR
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

    fn apply_kind_defaults(&mut self, _entry: &VersionCatalogEntry) {
        let ssl_mode = match self.spec.common.tls {
            Some(_) => PgBouncerSSLMode::VerifyFull,
            None => PgBouncerSSLMode::Disable,
        };
        self.spec.ssl_mode.get_or_insert(ssl_mode);

        if let Some(pool) = self.spec.connection_pool.as_mut() {
            pool.port.get_or_insert(PGBOUNCER_DATABASE_PORT);
            pool.pool_mode.get_or_insert_with(|| PGBOUNCER_DEFAULT_POOL_MODE.to_string());
            pool.auth_type.get_or_insert(PgBouncerClientAuthMode::Md5);
            pool.ignore_startup_parameters
                .get_or_insert_with(|| PGBOUNCER_DEFAULT_IGNORE_STARTUP_PARAMETERS.to_string());
        }
    }

    /// The auth secret is kept even when the name was derived, together with
    /// the backend user list and the rendered configuration.
    fn extra_persistent_secrets(&self) -> Vec<String> {
        let mut secrets = Vec::new();
        if self.spec.common.auth_secret.is_none() {
            secrets.push(self.auth_secret_name());
        }
        secrets.push(self.backend_secret_name());
        secrets.push(self.final_config_secret_name());
        secrets
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let database = spec_path().child("database");
        if self.spec.database.database_ref.name.is_empty() {
            errors.required(database.child("databaseRef").child("name"), "the backend AppBinding must be named");
        }
        if self.spec.database.database_name.is_empty() {
            errors.required(database.child("databaseName"), "databaseName can not be empty");
        }

        match self.spec.ssl_mode {
            Some(mode) if mode != PgBouncerSSLMode::Disable && self.spec.common.tls.is_none() => {
                errors.invalid(spec_path().child("sslMode"), mode.as_str(), "sslMode other than disable needs spec.tls to be set");
            },
            _ => {},
        }
        if self.spec.common.tls.is_some() && self.spec.ssl_mode == Some(PgBouncerSSLMode::Disable) {
            errors.invalid(spec_path().child("sslMode"), "disable", "sslMode can not be disable while spec.tls is set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMPONENT_LABEL_KEY;
    use crate::crd::common::{SecretReference, StorageType, TlsConfig};
    use crate::crd::v1::testing::{catalog, entry, issuer};
    use crate::defaults::{apply_defaults, set_defaults};
    use crate::validation::validate_create_or_update;

    fn pgbouncer() -> PgBouncer {
        let mut db = PgBouncer::new("pb", PgBouncerSpec {
            common: DatabaseCommonSpec { version: "1.18.0".to_string(), ..Default::default() },
            database: PgBouncerDatabaseRef {
                database_ref: AppReference { name: "pg".to_string(), namespace: Some("demo".to_string()) },
                database_name: "postgres".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });
        db.metadata.namespace = Some("demo".to_string());
        db
    }

    #[test]
    fn test_defaults_without_storage() {
        let mut db = pgbouncer();
        let catalog = catalog(vec![entry("1.18.0", 70)]);

        set_defaults(&mut db, &catalog).unwrap();

        assert_eq!(db.spec.common.storage_type, None);
        assert_eq!(db.spec.ssl_mode, Some(PgBouncerSSLMode::Disable));
        assert_eq!(db.spec.common.pod_template.spec.containers[0].name, "pgbouncer");
        assert!(validate_create_or_update(&db, &catalog).is_ok());
    }

    #[test]
    fn test_ssl_mode_follows_tls() {
        let mut db = pgbouncer();
        db.spec.common.tls = Some(TlsConfig { issuer_ref: Some(issuer()), ..Default::default() });

        apply_defaults(&mut db, &entry("1.18.0", 70)).unwrap();

        assert_eq!(db.spec.ssl_mode, Some(PgBouncerSSLMode::VerifyFull));
        assert_eq!(db.cert_secret_name("client"), "pb-client-cert");
    }

    #[test]
    fn test_connection_pool_defaults_keep_user_values() {
        let mut db = pgbouncer();
        db.spec.connection_pool = Some(ConnectionPoolConfig {
            pool_mode: Some("transaction".to_string()),
            ..Default::default()
        });

        apply_defaults(&mut db, &entry("1.18.0", 70)).unwrap();

        let pool = db.spec.connection_pool.as_ref().unwrap();
        assert_eq!(pool.port, Some(5432));
        assert_eq!(pool.pool_mode.as_deref(), Some("transaction"));
        assert_eq!(pool.auth_type, Some(PgBouncerClientAuthMode::Md5));
        assert_eq!(db.port(), 5432);
    }

    #[test]
    fn test_names() {
        let mut db = pgbouncer();
        assert_eq!(db.persistent_secrets(), vec![
            "pb-auth".to_string(),
            "pb-backend".to_string(),
            "pb-final-config".to_string(),
        ]);
        assert_eq!(db.replicas_service_name(), "pb-replicas");
        assert_eq!(
            db.offshoot_labels().get(COMPONENT_LABEL_KEY).map(String::as_str),
            Some("connection-pooler")
        );

        db.spec.common.auth_secret = Some(SecretReference { name: "creds".to_string(), ..Default::default() });
        assert_eq!(db.persistent_secrets()[0], "creds");
        assert_eq!(db.persistent_secrets().len(), 3);
    }

    #[test]
    fn test_validation() {
        let mut db = pgbouncer();
        db.spec.database = PgBouncerDatabaseRef::default();
        db.spec.ssl_mode = Some(PgBouncerSSLMode::Require);
        db.spec.common.storage_type = Some(StorageType::Durable);
        let catalog = catalog(vec![entry("1.18.0", 70)]);

        set_defaults(&mut db, &catalog).unwrap();
        let err = validate_create_or_update(&db, &catalog).unwrap_err();

        let crate::error::ApiError::Invalid { errors, .. } = err else { panic!("expected Invalid") };
        assert!(errors.has_path("spec.database.databaseRef.name"));
        assert!(errors.has_path("spec.database.databaseName"));
        assert!(errors.has_path("spec.sslMode"));
        assert!(errors.has_path("spec.storageType"));
    }
}
