pub mod elasticsearch;
pub mod kafka;
pub mod mariadb;
pub mod memcached;
pub mod mongodb;
pub mod mysql;
pub mod perconaxtradb;
pub mod pgbouncer;
pub mod postgres;
pub mod proxysql;
pub mod redis;
pub mod redis_sentinel;

pub use elasticsearch::{Elasticsearch, ElasticsearchSpec};
pub use kafka::{Kafka, KafkaSpec};
pub use mariadb::{MariaDB, MariaDBSpec};
pub use memcached::{Memcached, MemcachedSpec};
pub use mongodb::{MongoDB, MongoDBSpec};
pub use mysql::{MySQL, MySQLSpec};
pub use perconaxtradb::{PerconaXtraDB, PerconaXtraDBSpec};
pub use pgbouncer::{PgBouncer, PgBouncerSpec};
pub use postgres::{Postgres, PostgresSpec};
pub use proxysql::{ProxySQL, ProxySQLSpec};
pub use redis::{Redis, RedisSpec};
pub use redis_sentinel::{RedisSentinel, RedisSentinelSpec};

#[cfg(test)]
pub(crate) mod testing {
    use k8s_openapi::api::core::v1::TypedLocalObjectReference;

    use crate::catalog::{InMemoryVersionCatalog, VersionCatalogEntry, VersionSecurityContext};

    pub fn entry(name: &str, uid: i64) -> VersionCatalogEntry {
        VersionCatalogEntry {
            name: name.to_string(),
            version: name.to_string(),
            db_image: format!("db:{}", name),
            security_context: VersionSecurityContext { run_as_user: Some(uid), run_as_group: None },
            ..Default::default()
        }
    }

    pub fn catalog(entries: Vec<VersionCatalogEntry>) -> InMemoryVersionCatalog {
        InMemoryVersionCatalog::new(entries)
    }

    pub fn issuer() -> TypedLocalObjectReference {
        TypedLocalObjectReference {
            api_group: Some("cert-manager.io".to_string()),
            kind: "Issuer".to_string(),
            name: "ca-issuer".to_string(),
        }
    }
}
