// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::apps::v1::StatefulSet;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crd::Database;
use crate::error::Result;
use crate::naming::Offshoot;

/// Lists the workloads of a namespace that carry every label of `selector`.
pub trait WorkloadLister {
    fn list(&self, namespace: &str, selector: &BTreeMap<String, String>) -> Result<Vec<StatefulSet>>;
}

/// A fixed set of workloads, filtered the way the API server filters.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkloadLister {
    workloads: Vec<StatefulSet>,
}

impl InMemoryWorkloadLister {
    pub fn new(workloads: Vec<StatefulSet>) -> Self {
        InMemoryWorkloadLister { workloads }
    }
}

impl WorkloadLister for InMemoryWorkloadLister {
    fn list(&self, namespace: &str, selector: &BTreeMap<String, String>) -> Result<Vec<StatefulSet>> {
        Ok(self
            .workloads
            .iter()
            .filter(|w| w.namespace().as_deref().unwrap_or_default() == namespace)
            .filter(|w| {
                let labels = w.labels();
                selector.iter().all(|(k, v)| labels.get(k) == Some(v))
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaReadiness {
    pub ready: bool,
    pub message: String,
}

impl ReplicaReadiness {
    fn ready() -> Self {
        ReplicaReadiness { ready: true, message: String::new() }
    }

    fn not_ready(message: String) -> Self {
        ReplicaReadiness { ready: false, message }
    }
}

/// Compare the listed workloads against `expected`, then require each of them
/// to be ready.
pub fn check_replicas(
    lister: &dyn WorkloadLister,
    namespace: &str,
    selector: &BTreeMap<String, String>,
    expected: usize,
) -> Result<ReplicaReadiness> {
    let items = lister.list(namespace, selector)?;
    if items.len() < expected {
        return Ok(ReplicaReadiness::not_ready(format!(
            "All workloads are not available. Desired number of workloads: {}, Available: {}",
            expected,
            items.len()
        )));
    }

    Ok(workloads_are_ready(&items))
}

/// Every workload has observed its latest generation and has all replicas ready.
pub fn workloads_are_ready(items: &[StatefulSet]) -> ReplicaReadiness {
    for item in items {
        let name = item.name_any();
        let desired = item.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
        let status = item.status.as_ref();
        let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);
        let observed = status.and_then(|s| s.observed_generation).unwrap_or(0);
        let generation = item.metadata.generation.unwrap_or(0);

        if observed < generation {
            return ReplicaReadiness::not_ready(format!(
                "workload {} has not observed generation {} yet (observed {})",
                name, generation, observed
            ));
        }
        if ready != desired {
            return ReplicaReadiness::not_ready(format!(
                "workload {} has {} of {} replicas ready",
                name, ready, desired
            ));
        }
    }

    ReplicaReadiness::ready()
}

/// Readiness of every workload `db` owns.
pub fn replicas_are_ready<D: Database>(db: &D, lister: &dyn WorkloadLister) -> Result<ReplicaReadiness> {
    check_replicas(lister, &db.namespace_or_default(), &db.offshoot_labels(), db.expected_workloads())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use k8s_openapi::api::apps::v1::{StatefulSetSpec, StatefulSetStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn workload(name: &str, desired: i32, ready: i32) -> StatefulSet {
        StatefulSet {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("demo".to_string()),
                labels: Some(BTreeMap::from([("app".to_string(), "db".to_string())])),
                generation: Some(2),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec { replicas: Some(desired), ..Default::default() }),
            status: Some(StatefulSetStatus {
                replicas: desired,
                ready_replicas: Some(ready),
                observed_generation: Some(2),
                ..Default::default()
            }),
        }
    }

    fn selector() -> BTreeMap<String, String> {
        BTreeMap::from([("app".to_string(), "db".to_string())])
    }

    struct FailingLister;

    impl WorkloadLister for FailingLister {
        fn list(&self, _: &str, _: &BTreeMap<String, String>) -> Result<Vec<StatefulSet>> {
            Err(ApiError::Lister("connection refused".to_string()))
        }
    }

    #[test]
    fn test_fewer_workloads_than_expected() {
        let lister = InMemoryWorkloadLister::new(vec![workload("db-0", 1, 1)]);

        let readiness = check_replicas(&lister, "demo", &selector(), 3).unwrap();

        assert!(!readiness.ready);
        assert_eq!(
            readiness.message,
            "All workloads are not available. Desired number of workloads: 3, Available: 1"
        );
    }

    #[test]
    fn test_all_workloads_ready() {
        let lister = InMemoryWorkloadLister::new(vec![workload("a", 3, 3), workload("b", 1, 1)]);

        assert!(check_replicas(&lister, "demo", &selector(), 2).unwrap().ready);
    }

    #[test]
    fn test_workload_with_missing_replicas() {
        let lister = InMemoryWorkloadLister::new(vec![workload("a", 3, 2)]);

        let readiness = check_replicas(&lister, "demo", &selector(), 1).unwrap();

        assert!(!readiness.ready);
        assert!(readiness.message.contains("2 of 3"));
    }

    #[test]
    fn test_selector_and_namespace_filter() {
        let mut other = workload("other", 1, 1);
        other.metadata.namespace = Some("prod".to_string());
        let lister = InMemoryWorkloadLister::new(vec![workload("a", 1, 1), other]);

        assert_eq!(lister.list("demo", &selector()).unwrap().len(), 1);
        assert!(lister.list("demo", &BTreeMap::from([("app".to_string(), "x".to_string())])).unwrap().is_empty());
    }

    #[test]
    fn test_lister_error_is_propagated() {
        let result = check_replicas(&FailingLister, "demo", &selector(), 1);

        assert!(matches!(result, Err(ApiError::Lister(_))));
    }
}
