// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

mod common;

use kubedb_api::AnyDatabase;

use crate::common::{catalog, parse, workload, ELASTICSEARCH_TOPOLOGY, MONGODB_SHARDED, REDIS_CLUSTER};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_sharded_mongodb_workloads() {
    let names = parse(MONGODB_SHARDED).names();

    assert_eq!(names.kind, "MongoDB");
    assert_eq!(names.workloads, strings(&["mg-shard0", "mg-shard1", "mg-shard2", "mg-configsvr", "mg-mongos"]));
    assert_eq!(names.governing_service_name, "mg-pods");
    assert_eq!(names.certificates.get("client").map(String::as_str), Some("mg-client-cert"));
}

#[test]
fn test_redis_cluster_workloads() {
    let names = parse(REDIS_CLUSTER).names();

    assert_eq!(names.workloads, strings(&["rd-shard0", "rd-shard1", "rd-shard2"]));
}

#[test]
fn test_elasticsearch_workloads_follow_suffixes() {
    let mut db = parse(ELASTICSEARCH_TOPOLOGY);
    db.set_defaults(&catalog()).unwrap();

    let names = db.names();

    assert_eq!(names.workloads, strings(&["es-master", "es-ingest", "es-data-hot"]));
    assert_eq!(names.primary_service_dns, "es.demo.svc");
}

#[test]
fn test_readiness_of_sharded_mongodb() {
    let db = parse(MONGODB_SHARDED);
    let AnyDatabase::MongoDB(mongodb) = &db else { panic!("expected MongoDB") };
    let labels = kubedb_api::Offshoot::offshoot_labels(mongodb);
    let lister = |count: usize| {
        kubedb_api::InMemoryWorkloadLister::new((0..count).map(|i| workload(&format!("w{}", i), &labels, 3)).collect())
    };

    let readiness = db.replicas_are_ready(&lister(4)).unwrap();
    assert!(!readiness.ready);
    assert_eq!(readiness.message, "All workloads are not available. Desired number of workloads: 5, Available: 4");

    assert!(db.replicas_are_ready(&lister(5)).unwrap().ready);
}
