// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub const GROUP_NAME: &str = "kubedb.com";
pub const API_VERSION: &str = "kubedb.com/v1";
pub const KUBEDB_ORGANIZATION: &str = "kubedb";

pub const NAME_LABEL_KEY: &str = "app.kubernetes.io/name";
pub const INSTANCE_LABEL_KEY: &str = "app.kubernetes.io/instance";
pub const MANAGED_BY_LABEL_KEY: &str = "app.kubernetes.io/managed-by";
pub const COMPONENT_LABEL_KEY: &str = "app.kubernetes.io/component";
pub const COMPONENT_DATABASE: &str = "database";
pub const COMPONENT_CONNECTION_POOLER: &str = "connection-pooler";

pub const LABEL_ROLE: &str = "kubedb.com/role";
pub const ROLE_STATS: &str = "stats";

pub const DEFAULT_HEALTH_CHECK_PERIOD_SECONDS: i32 = 10;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: i32 = 10;

pub const PROMETHEUS_EXPORTER_PORT: i32 = 56790;
pub const PROMETHEUS_OPERATOR_AGENT: &str = "prometheus.io/operator";
pub const SERVICE_MONITOR_INTERVAL: &str = "10s";

pub const REPLICATION_MODE_DETECTOR_CONTAINER_NAME: &str = "replication-mode-detector";

pub const MYSQL_CONTAINER_NAME: &str = "mysql";
pub const MYSQL_INIT_CONTAINER_NAME: &str = "mysql-init";
pub const MYSQL_COORDINATOR_CONTAINER_NAME: &str = "mysql-coordinator";
pub const MYSQL_ROUTER_CONTAINER_NAME: &str = "mysql-router";
pub const MYSQL_DEFAULT_GROUP_SIZE: i32 = 3;
pub const MYSQL_COMPONENT_KEY: &str = "mysql.kubedb.com/component";
pub const MYSQL_COMPONENT_ROUTER: &str = "router";

pub const POSTGRES_CONTAINER_NAME: &str = "postgres";
pub const POSTGRES_INIT_CONTAINER_NAME: &str = "postgres-init-container";
pub const POSTGRES_COORDINATOR_CONTAINER_NAME: &str = "pg-coordinator";

pub const MARIADB_CONTAINER_NAME: &str = "mariadb";
pub const MARIADB_INIT_CONTAINER_NAME: &str = "mariadb-init";
pub const MARIADB_COORDINATOR_CONTAINER_NAME: &str = "md-coordinator";

pub const REDIS_CONTAINER_NAME: &str = "redis";
pub const REDIS_INIT_CONTAINER_NAME: &str = "redis-init";
pub const REDIS_COORDINATOR_CONTAINER_NAME: &str = "rd-coordinator";
pub const REDIS_SHARD_KEY: &str = "redis.kubedb.com/shard";
pub const REDIS_DATABASE_PORT: i32 = 6379;
pub const REDIS_DEFAULT_SHARDS: i32 = 3;
pub const REDIS_DEFAULT_SHARD_REPLICAS: i32 = 2;

pub const PERCONA_XTRADB_CONTAINER_NAME: &str = "perconaxtradb";
pub const PERCONA_XTRADB_INIT_CONTAINER_NAME: &str = "px-init";
pub const PERCONA_XTRADB_COORDINATOR_CONTAINER_NAME: &str = "px-coordinator";
pub const PERCONA_XTRADB_DEFAULT_CLUSTER_SIZE: i32 = 3;
pub const PERCONA_XTRADB_MAX_CLUSTER_NAME_LENGTH: usize = 32;
pub const PERCONA_XTRADB_CERT_MOUNT_PATH: &str = "/etc/mysql/certs";

pub const PGBOUNCER_CONTAINER_NAME: &str = "pgbouncer";
pub const PGBOUNCER_DATABASE_PORT: i32 = 5432;
pub const PGBOUNCER_DEFAULT_POOL_MODE: &str = "session";
pub const PGBOUNCER_DEFAULT_IGNORE_STARTUP_PARAMETERS: &str = "empty";

pub const PROXYSQL_CONTAINER_NAME: &str = "proxysql";
pub const PROXYSQL_DATABASE_PORT: i32 = 6033;
pub const PROXYSQL_ADMIN_PORT: i32 = 6032;

pub const REDIS_SENTINEL_CONTAINER_NAME: &str = "redissentinel";
pub const REDIS_SENTINEL_INIT_CONTAINER_NAME: &str = "sentinel-init";
pub const REDIS_SENTINEL_PORT: i32 = 26379;

pub const MEMCACHED_CONTAINER_NAME: &str = "memcached";
pub const MEMCACHED_DATABASE_PORT: i32 = 11211;

pub const MONGODB_CONTAINER_NAME: &str = "mongodb";
pub const MONGODB_INIT_CONTAINER_NAME: &str = "copy-config";
pub const MONGODB_NODE_TYPE_SHARD: &str = "shard";
pub const MONGODB_NODE_TYPE_CONFIG: &str = "configsvr";
pub const MONGODB_NODE_TYPE_MONGOS: &str = "mongos";
pub const MONGODB_NODE_TYPE_ARBITER: &str = "arbiter";
pub const MONGODB_NODE_TYPE_HIDDEN: &str = "hidden";
pub const MONGODB_NODE_TYPE_KEY: &str = "mongodb.kubedb.com/node.type";
pub const MONGODB_SHARD_KEY: &str = "mongodb.kubedb.com/node.shard";
pub const MONGODB_CONFIG_KEY: &str = "mongodb.kubedb.com/node.config";
pub const MONGODB_MONGOS_KEY: &str = "mongodb.kubedb.com/node.mongos";
pub const MONGODB_DATABASE_PORT: i32 = 27017;

pub const KAFKA_CONTAINER_NAME: &str = "kafka";
pub const KAFKA_CLUSTER_ID_ENV: &str = "KAFKA_CLUSTER_ID";
pub const KAFKA_NODE_ROLE_CONTROLLER: &str = "controller";
pub const KAFKA_NODE_ROLE_BROKER: &str = "broker";
pub const KAFKA_NODE_ROLE_SET: &str = "set";
pub const KAFKA_CRUISE_CONTROL: &str = "cruise-control";
pub const KAFKA_RESERVED_VOLUMES: &[&str] = &["data", "kafkaconfig", "temp-config"];
pub const KAFKA_RESERVED_MOUNT_PATHS: &[&str] = &[
    "/opt/kafka/config/kafkaconfig",
    "/opt/kafka/config/temp-config",
    "/var/log/kafka",
    "/var/log/kafka/metadata",
    "/var/private/ssl",
];

pub const ELASTICSEARCH_CONTAINER_NAME: &str = "elasticsearch";
pub const ELASTICSEARCH_INIT_CONTAINER_NAME: &str = "config-merger";
pub const ELASTICSEARCH_MAX_MAP_COUNT_SYSCTL: &str = "vm.max_map_count";
pub const ELASTICSEARCH_MAX_MAP_COUNT: &str = "262144";
pub const ELASTICSEARCH_REST_PORT: i32 = 9200;
pub const ELASTICSEARCH_NODE_ROLE_SET: &str = "set";

/// Named resource requirement profiles shared by the database kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceProfile {
    Database,
    MemoryIntensive,
    InitContainer,
    Coordinator,
}

impl ResourceProfile {
    pub fn requirements(&self) -> ResourceRequirements {
        match self {
            ResourceProfile::Database => requirements(".500", "1024Mi", "1024Mi"),
            ResourceProfile::MemoryIntensive => requirements(".500", "1.5Gi", "1.5Gi"),
            ResourceProfile::InitContainer => requirements(".200", "256Mi", "512Mi"),
            ResourceProfile::Coordinator => requirements(".200", "256Mi", "256Mi"),
        }
    }
}

fn requirements(cpu_request: &str, memory_request: &str, memory_limit: &str) -> ResourceRequirements {
    ResourceRequirements {
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(cpu_request.to_string())),
            ("memory".to_string(), Quantity(memory_request.to_string())),
        ])),
        limits: Some(BTreeMap::from([
            ("memory".to_string(), Quantity(memory_limit.to_string())),
        ])),
        ..Default::default()
    }
}
