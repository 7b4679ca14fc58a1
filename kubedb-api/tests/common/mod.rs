// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec, StatefulSetStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use kubedb_api::catalog::{AuthPlugin, VersionSecurityContext};
use kubedb_api::{AnyDatabase, InMemoryVersionCatalog, VersionCatalogEntry};

pub const NAMESPACE: &str = "demo";

pub const ELASTICSEARCH_VERSION: &str = "xpack-8.11.1";
pub const KAFKA_VERSION: &str = "3.6.1";
pub const MARIADB_VERSION: &str = "11.1.3";
pub const MEMCACHED_VERSION: &str = "1.6.22";
pub const MONGODB_VERSION: &str = "6.0.12";
pub const MYSQL_VERSION: &str = "8.0.35";
pub const PERCONA_XTRADB_VERSION: &str = "8.0.31";
pub const PGBOUNCER_VERSION: &str = "1.18.0";
pub const POSTGRES_VERSION: &str = "16.1";
pub const PROXYSQL_VERSION: &str = "2.4.4-debian";
pub const REDIS_VERSION: &str = "7.2.3";

fn entry(name: &str, image: &str, uid: i64) -> VersionCatalogEntry {
    VersionCatalogEntry {
        name: name.to_string(),
        version: name.trim_start_matches("xpack-").to_string(),
        db_image: format!("{}:{}", image, name),
        security_context: VersionSecurityContext { run_as_user: Some(uid), run_as_group: Some(uid) },
        ..Default::default()
    }
}

/// A catalog holding one entry per supported kind.
pub fn catalog() -> InMemoryVersionCatalog {
    InMemoryVersionCatalog::new(vec![
        VersionCatalogEntry {
            auth_plugin: Some(AuthPlugin::XPack),
            ..entry(ELASTICSEARCH_VERSION, "elasticsearch", 1000)
        },
        entry(KAFKA_VERSION, "kafka", 1001),
        entry(MARIADB_VERSION, "mariadb", 999),
        entry(MEMCACHED_VERSION, "memcached", 999),
        entry(MONGODB_VERSION, "mongo", 999),
        entry(MYSQL_VERSION, "mysql", 999),
        entry(PERCONA_XTRADB_VERSION, "percona-xtradb-cluster", 1001),
        entry(PGBOUNCER_VERSION, "pgbouncer", 70),
        entry(POSTGRES_VERSION, "postgres", 70),
        entry(PROXYSQL_VERSION, "proxysql", 999),
        entry(REDIS_VERSION, "redis", 999),
    ])
}

pub fn parse(manifest: &str) -> AnyDatabase {
    AnyDatabase::from_yaml(manifest).unwrap()
}

pub fn minimal(kind: &str, version: &str) -> String {
    format!(
        "apiVersion: kubedb.com/v1\nkind: {}\nmetadata:\n  name: db\n  namespace: {}\nspec:\n  version: \"{}\"\n",
        kind, NAMESPACE, version
    )
}

/// `minimal` plus a storage request, enough to pass validation as `Durable`.
pub fn with_storage(kind: &str, version: &str) -> String {
    format!("{}{}", minimal(kind, version), STORAGE)
}

const STORAGE: &str = "  storage:\n    resources:\n      requests:\n        storage: 1Gi\n";

pub const KAFKA_TOPOLOGY: &str = r#"
apiVersion: kubedb.com/v1
kind: Kafka
metadata:
  name: kf
  namespace: demo
spec:
  version: "3.6.1"
  storageType: Durable
  topology:
    controller:
      storage:
        resources:
          requests:
            storage: 1Gi
    broker:
      storage:
        resources:
          requests:
            storage: 1Gi
"#;

pub const ELASTICSEARCH_TOPOLOGY: &str = r#"
apiVersion: kubedb.com/v1
kind: Elasticsearch
metadata:
  name: es
  namespace: demo
spec:
  version: "xpack-8.11.1"
  storageType: Ephemeral
  enableSSL: true
  topology:
    master:
      replicas: 3
    ingest:
      replicas: 2
    dataHot:
      replicas: 2
"#;

pub const MONGODB_SHARDED: &str = r#"
apiVersion: kubedb.com/v1
kind: MongoDB
metadata:
  name: mg
  namespace: demo
spec:
  version: "6.0.12"
  storageType: Durable
  shardTopology:
    shard:
      shards: 3
      replicas: 3
      storage:
        resources:
          requests:
            storage: 1Gi
    configServer:
      replicas: 3
      storage:
        resources:
          requests:
            storage: 1Gi
    mongos:
      replicas: 2
"#;

pub const REDIS_CLUSTER: &str = r#"
apiVersion: kubedb.com/v1
kind: Redis
metadata:
  name: rd
  namespace: demo
spec:
  version: "7.2.3"
  mode: Cluster
  storage:
    resources:
      requests:
        storage: 1Gi
"#;

pub const PGBOUNCER: &str = r#"
apiVersion: kubedb.com/v1
kind: PgBouncer
metadata:
  name: pb
  namespace: demo
spec:
  version: "1.18.0"
  replicas: 2
  database:
    syncUsers: true
    databaseRef:
      name: pg
      namespace: demo
    databaseName: postgres
  connectionPool:
    poolMode: transaction
"#;

pub const PROXYSQL: &str = r#"
apiVersion: kubedb.com/v1
kind: ProxySQL
metadata:
  name: proxy
  namespace: demo
spec:
  version: "2.4.4-debian"
  replicas: 3
  backend:
    apiGroup: kubedb.com
    kind: MySQL
    name: my
  syncUsers: true
"#;

pub const REDIS_SENTINEL: &str = r#"
apiVersion: kubedb.com/v1
kind: RedisSentinel
metadata:
  name: sen
  namespace: demo
spec:
  version: "7.2.3"
  replicas: 3
  storageType: Ephemeral
"#;

/// One manifest per kind, each in the richest topology it supports.
pub fn manifests() -> Vec<AnyDatabase> {
    let mut manifests: Vec<AnyDatabase> = [
        ("MariaDB", MARIADB_VERSION),
        ("MySQL", MYSQL_VERSION),
        ("PerconaXtraDB", PERCONA_XTRADB_VERSION),
        ("Postgres", POSTGRES_VERSION),
    ]
        .iter()
        .map(|(kind, version)| parse(&with_storage(kind, version)))
        .collect();

    manifests.push(parse(&minimal("Memcached", MEMCACHED_VERSION)));

    manifests.extend(
        [KAFKA_TOPOLOGY, ELASTICSEARCH_TOPOLOGY, MONGODB_SHARDED, REDIS_CLUSTER, PGBOUNCER, PROXYSQL, REDIS_SENTINEL]
            .map(parse),
    );
    manifests
}

/// A ready workload carrying `labels`.
pub fn workload(name: &str, labels: &BTreeMap<String, String>, replicas: i32) -> StatefulSet {
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(labels.clone()),
            generation: Some(1),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec { replicas: Some(replicas), ..Default::default() }),
        status: Some(StatefulSetStatus {
            replicas,
            ready_replicas: Some(replicas),
            observed_generation: Some(1),
            ..Default::default()
        }),
    }
}
