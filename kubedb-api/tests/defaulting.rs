// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

mod common;

use kubedb_api::constants::KAFKA_CLUSTER_ID_ENV;
use kubedb_api::crd::common::{DeletionPolicy, HealthCheckSpec, StorageType};
use kubedb_api::crd::v1::kafka::cluster_id;
use kubedb_api::{AnyDatabase, ApiError, Database};

use crate::common::{catalog, manifests, minimal, parse, KAFKA_TOPOLOGY, MYSQL_VERSION};

#[test]
fn test_mysql_defaults_from_nothing() {
    let mut db = parse(&minimal("MySQL", MYSQL_VERSION));

    db.set_defaults(&catalog()).unwrap();

    let AnyDatabase::MySQL(mysql) = db else { panic!("expected MySQL") };
    let common = mysql.common();
    assert_eq!(common.replicas, Some(1));
    assert_eq!(common.storage_type, Some(StorageType::Durable));
    assert_eq!(common.deletion_policy, Some(DeletionPolicy::Delete));
    assert_eq!(common.health_checker, HealthCheckSpec {
        period_seconds: Some(10),
        timeout_seconds: Some(10),
        failure_threshold: Some(1),
        disable_write_check: false,
    });
    assert_eq!(common.pod_template.spec.service_account_name.as_deref(), Some("db"));
    assert_eq!(common.pod_template.spec.containers[0].name, "mysql");
}

#[test]
fn test_kafka_roles_share_cluster_id() {
    let mut db = parse(KAFKA_TOPOLOGY);

    db.set_defaults(&catalog()).unwrap();

    let AnyDatabase::Kafka(kafka) = db else { panic!("expected Kafka") };
    let topology = kafka.spec.topology.as_ref().unwrap();
    let controller = topology.controller.as_ref().unwrap();
    let broker = topology.broker.as_ref().unwrap();

    assert_eq!(controller.replicas, Some(1));
    assert_eq!(broker.replicas, Some(1));
    assert_eq!(controller.suffix.as_deref(), Some("controller"));
    assert_eq!(broker.suffix.as_deref(), Some("broker"));

    let id = cluster_id(&controller.pod_template).unwrap();
    assert!(!id.is_empty());
    assert!(id.ends_with('w'));
    assert_eq!(cluster_id(&broker.pod_template), Some(id));
    assert_eq!(kafka.workload_names(), vec!["kf-controller".to_string(), "kf-broker".to_string()]);
}

#[test]
fn test_kafka_keeps_user_cluster_id() {
    let manifest = KAFKA_TOPOLOGY.replacen(
        "    broker:\n",
        &format!(
            "    broker:\n      podTemplate:\n        spec:\n          containers:\n          - name: kafka\n            env:\n            - name: {}\n              value: fixed-idw\n",
            KAFKA_CLUSTER_ID_ENV
        ),
        1,
    );
    let mut db = parse(&manifest);

    db.set_defaults(&catalog()).unwrap();

    let AnyDatabase::Kafka(kafka) = db else { panic!("expected Kafka") };
    let topology = kafka.spec.topology.as_ref().unwrap();
    assert_eq!(cluster_id(&topology.controller.as_ref().unwrap().pod_template), Some("fixed-idw"));
    assert_eq!(cluster_id(&topology.broker.as_ref().unwrap().pod_template), Some("fixed-idw"));
}

#[test]
fn test_every_kind_defaults_and_validates() {
    let catalog = catalog();
    for mut db in manifests() {
        db.set_defaults(&catalog).unwrap_or_else(|e| panic!("{}: {}", db.kind(), e));
        db.validate_create_or_update(&catalog).unwrap_or_else(|e| panic!("{}: {}", db.kind(), e));
        db.validate_delete().unwrap();
    }
}

#[test]
fn test_defaulting_is_idempotent_for_every_kind() {
    let catalog = catalog();
    for mut db in manifests() {
        db.set_defaults(&catalog).unwrap();
        let once = db.clone();

        db.set_defaults(&catalog).unwrap();

        assert_eq!(db, once, "{} changed on the second pass", db.kind());
    }
}

#[test]
fn test_defaulted_manifest_survives_serialization() {
    let catalog = catalog();
    for mut db in manifests() {
        db.set_defaults(&catalog).unwrap();

        let reparsed = AnyDatabase::from_yaml(&db.to_yaml().unwrap()).unwrap();

        assert_eq!(reparsed, db, "{} did not survive a YAML round trip", db.kind());
    }
}

#[test]
fn test_missing_version_leaves_manifest_untouched() {
    let mut db = parse(&minimal("Postgres", "9.9"));
    let before = db.clone();

    let err = db.set_defaults(&catalog()).unwrap_err();

    assert!(matches!(err, ApiError::VersionLookup { ref version, .. } if version == "9.9"));
    assert_eq!(db, before);
}

#[test]
fn test_halt_with_do_not_terminate_is_rejected() {
    let manifest = format!("{}  halted: true\n  deletionPolicy: DoNotTerminate\n", minimal("MariaDB", common::MARIADB_VERSION));
    let mut db = parse(&manifest);
    let before = db.clone();

    let err = db.set_defaults(&catalog()).unwrap_err();

    assert!(matches!(err, ApiError::HaltForbidden(_)));
    assert_eq!(db, before);
}

#[test]
fn test_do_not_terminate_blocks_delete() {
    let manifest = format!("{}  deletionPolicy: DoNotTerminate\n", minimal("Redis", common::REDIS_VERSION));
    let db = parse(&manifest);

    assert!(matches!(db.validate_delete(), Err(ApiError::DeletionForbidden { kind: "Redis", .. })));
}

#[test]
fn test_proxies_get_no_storage_type() {
    let catalog = catalog();
    for manifest in [common::PGBOUNCER, common::PROXYSQL] {
        let mut db = parse(manifest);

        db.set_defaults(&catalog).unwrap();

        let spec = &db.to_value().unwrap()["spec"];
        assert!(spec.get("storageType").is_none(), "{} got a storageType", db.kind());
        assert_eq!(spec["deletionPolicy"], "Delete");
    }
}

#[test]
fn test_every_kind_is_covered_by_fixtures() {
    let kinds: Vec<_> = manifests().iter().map(AnyDatabase::kind).collect();

    for kind in AnyDatabase::KINDS {
        assert!(kinds.contains(&kind), "no fixture for {}", kind);
    }
}
