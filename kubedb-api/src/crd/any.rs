// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::ResourceExt;
use serde_json::Value;

use crate::catalog::VersionCatalog;
use crate::constants::GROUP_NAME;
use crate::crd::Database;
use crate::crd::v1::{
    Elasticsearch, Kafka, MariaDB, Memcached, MongoDB, MySQL, PerconaXtraDB, PgBouncer, Postgres, ProxySQL, Redis,
    RedisSentinel,
};
use crate::defaults;
use crate::error::{ApiError, Result};
use crate::naming::{DerivedNames, derived_names};
use crate::readiness::{self, ReplicaReadiness, WorkloadLister};
use crate::validation;

pub const API_VERSION: &str = "kubedb.com/v1";

/// A database manifest of any supported kind, picked from its `kind` field.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDatabase {
    Elasticsearch(Elasticsearch),
    Kafka(Kafka),
    MariaDB(MariaDB),
    Memcached(Memcached),
    MongoDB(MongoDB),
    MySQL(MySQL),
    PerconaXtraDB(PerconaXtraDB),
    PgBouncer(PgBouncer),
    Postgres(Postgres),
    ProxySQL(ProxySQL),
    Redis(Redis),
    RedisSentinel(RedisSentinel),
}

macro_rules! with_database {
    ($any:expr, $db:ident => $body:expr) => {
        match $any {
            AnyDatabase::Elasticsearch($db) => $body,
            AnyDatabase::Kafka($db) => $body,
            AnyDatabase::MariaDB($db) => $body,
            AnyDatabase::Memcached($db) => $body,
            AnyDatabase::MongoDB($db) => $body,
            AnyDatabase::MySQL($db) => $body,
            AnyDatabase::PerconaXtraDB($db) => $body,
            AnyDatabase::PgBouncer($db) => $body,
            AnyDatabase::Postgres($db) => $body,
            AnyDatabase::ProxySQL($db) => $body,
            AnyDatabase::Redis($db) => $body,
            AnyDatabase::RedisSentinel($db) => $body,
        }
    };
}

impl AnyDatabase {
    pub const KINDS: [&'static str; 12] = [
        "Elasticsearch",
        "Kafka",
        "MariaDB",
        "Memcached",
        "MongoDB",
        "MySQL",
        "PerconaXtraDB",
        "PgBouncer",
        "Postgres",
        "ProxySQL",
        "Redis",
        "RedisSentinel",
    ];

    pub fn from_value(value: Value) -> Result<Self> {
        let api_version = value.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
        let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();

        if api_version != API_VERSION {
            return Err(ApiError::UnknownKind(format!("{} ({}), expected group {}", kind, api_version, GROUP_NAME)));
        }

        Ok(match kind.as_str() {
            "Elasticsearch" => AnyDatabase::Elasticsearch(serde_json::from_value(value)?),
            "Kafka" => AnyDatabase::Kafka(serde_json::from_value(value)?),
            "MariaDB" => AnyDatabase::MariaDB(serde_json::from_value(value)?),
            "Memcached" => AnyDatabase::Memcached(serde_json::from_value(value)?),
            "MongoDB" => AnyDatabase::MongoDB(serde_json::from_value(value)?),
            "MySQL" => AnyDatabase::MySQL(serde_json::from_value(value)?),
            "PerconaXtraDB" => AnyDatabase::PerconaXtraDB(serde_json::from_value(value)?),
            "PgBouncer" => AnyDatabase::PgBouncer(serde_json::from_value(value)?),
            "Postgres" => AnyDatabase::Postgres(serde_json::from_value(value)?),
            "ProxySQL" => AnyDatabase::ProxySQL(serde_json::from_value(value)?),
            "Redis" => AnyDatabase::Redis(serde_json::from_value(value)?),
            "RedisSentinel" => AnyDatabase::RedisSentinel(serde_json::from_value(value)?),
            _ => return Err(ApiError::UnknownKind(kind)),
        })
    }

    /// Parse a single YAML or JSON manifest.
    pub fn from_yaml(document: &str) -> Result<Self> {
        let value: Value = serde_norway::from_str(document)?;
        Self::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(with_database!(self, db => serde_json::to_value(db)?))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_norway::to_string(&self.to_value()?)?)
    }

    pub fn kind(&self) -> &'static str {
        with_database!(self, db => db.descriptor().kind)
    }

    pub fn name(&self) -> String {
        with_database!(self, db => db.name_any())
    }

    pub fn version(&self) -> &str {
        with_database!(self, db => db.common().version.as_str())
    }

    pub fn set_defaults(&mut self, catalog: &dyn VersionCatalog) -> Result<()> {
        with_database!(self, db => defaults::set_defaults(db, catalog))
    }

    pub fn validate_create_or_update(&self, catalog: &dyn VersionCatalog) -> Result<()> {
        with_database!(self, db => validation::validate_create_or_update(db, catalog))
    }

    pub fn validate_delete(&self) -> Result<()> {
        with_database!(self, db => validation::validate_delete(db))
    }

    pub fn replicas_are_ready(&self, lister: &dyn WorkloadLister) -> Result<ReplicaReadiness> {
        with_database!(self, db => readiness::replicas_are_ready(db, lister))
    }

    pub fn names(&self) -> DerivedNames {
        with_database!(self, db => derived_names(db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::v1::testing::{catalog, entry};
    use crate::crd::common::DeletionPolicy;

    const MEMCACHED: &str = r#"
apiVersion: kubedb.com/v1
kind: Memcached
metadata:
  name: mc
  namespace: demo
spec:
  version: "1.6.22"
"#;

    #[test]
    fn test_from_yaml_picks_kind() {
        let db = AnyDatabase::from_yaml(MEMCACHED).unwrap();

        assert_eq!(db.kind(), "Memcached");
        assert_eq!(db.name(), "mc");
        assert_eq!(db.version(), "1.6.22");
    }

    #[test]
    fn test_unknown_kind() {
        let err = AnyDatabase::from_yaml("apiVersion: kubedb.com/v1\nkind: Cassandra\nmetadata:\n  name: c\n")
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownKind(kind) if kind == "Cassandra"));

        let err = AnyDatabase::from_yaml("apiVersion: apps/v1\nkind: MySQL\n").unwrap_err();
        assert!(matches!(err, ApiError::UnknownKind(_)));
    }

    #[test]
    fn test_set_defaults_through_dispatch() {
        let mut db = AnyDatabase::from_yaml(MEMCACHED).unwrap();

        db.set_defaults(&catalog(vec![entry("1.6.22", 999)])).unwrap();

        let AnyDatabase::Memcached(memcached) = &db else { panic!("expected Memcached") };
        assert_eq!(memcached.spec.common.deletion_policy, Some(DeletionPolicy::Delete));
        assert_eq!(memcached.spec.common.replicas, Some(1));
        assert!(db.to_yaml().unwrap().contains("deletionPolicy: Delete"));
    }

    #[test]
    fn test_pooler_dispatch() {
        let mut db = AnyDatabase::from_yaml(
            "apiVersion: kubedb.com/v1\nkind: PgBouncer\nmetadata:\n  name: pb\n  namespace: demo\nspec:\n  version: \"1.18.0\"\n  database:\n    databaseRef:\n      name: pg\n    databaseName: postgres\n",
        )
        .unwrap();
        let catalog = catalog(vec![entry("1.18.0", 70)]);

        db.set_defaults(&catalog).unwrap();

        assert_eq!(db.kind(), "PgBouncer");
        assert!(db.validate_create_or_update(&catalog).is_ok());
        assert_eq!(db.names().persistent_secrets, vec!["pb-auth", "pb-backend", "pb-final-config"]);
        assert!(!db.to_yaml().unwrap().contains("storageType"));
    }

    #[test]
    fn test_missing_version() {
        let mut db = AnyDatabase::from_yaml(MEMCACHED).unwrap();
        let before = db.clone();

        let err = db.set_defaults(&catalog(Vec::new())).unwrap_err();

        assert!(matches!(err, ApiError::VersionLookup { .. }));
        assert_eq!(db, before);
    }
}
