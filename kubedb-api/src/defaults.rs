// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::{
    Capabilities, Container, PodSecurityContext, ResourceRequirements, SeccompProfile, SecurityContext,
};
use kube::ResourceExt;
use kubedb_common::telemetry::debug;

use crate::catalog::{VersionCatalog, VersionCatalogEntry};
use crate::constants::{
    DEFAULT_HEALTH_CHECK_PERIOD_SECONDS, DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS, PROMETHEUS_EXPORTER_PORT,
    PROMETHEUS_OPERATOR_AGENT, SERVICE_MONITOR_INTERVAL, ResourceProfile,
};
use crate::crd::{Database, common::{AgentSpec, DeletionPolicy, HealthCheckSpec, PodTemplateSpec, StorageType}};
use crate::crd::kind::KindDescriptor;
use crate::error::{ApiError, Result};

/// Look up the version of `db` in `catalog` and default it against the entry.
///
/// The lookup and every precondition are checked before the first write, so on
/// error `db` is left exactly as it was passed in.
pub fn set_defaults<D: Database>(db: &mut D, catalog: &dyn VersionCatalog) -> Result<()> {
    let version = db.common().version.clone();
    let entry = catalog.get(&version)?;

    apply_defaults(db, &entry)
}

/// Fill every unset field of `db` from the static rules and the catalog entry.
/// Set fields are never touched, so applying the defaults twice is the same as
/// applying them once.
pub fn apply_defaults<D: Database>(db: &mut D, entry: &VersionCatalogEntry) -> Result<()> {
    let name = db.name_any();
    let descriptor = db.descriptor();

    {
        let common = db.common();
        if common.halted && common.deletion_policy == Some(DeletionPolicy::DoNotTerminate) {
            return Err(ApiError::HaltForbidden(name));
        }
    }

    let has_storage = db.has_storage();
    {
        let common = db.common_mut();
        if common.halted {
            common.deletion_policy = Some(DeletionPolicy::Halt);
        }
        common.deletion_policy.get_or_insert(DeletionPolicy::Delete);
        if has_storage {
            common.storage_type.get_or_insert(StorageType::Durable);
        }
    }

    db.apply_kind_defaults(entry);

    if !db.topology().is_divided() {
        let replicas = db.default_replicas();
        db.common_mut().replicas.get_or_insert(replicas);
    }

    let coordinator = db.uses_coordinator();
    if db.uses_main_pod_template() {
        default_pod_template(&mut db.common_mut().pod_template, entry, descriptor, &name, coordinator);
    } else {
        set_service_account(&mut db.common_mut().pod_template, &name);
    }

    for role in db.roles_mut() {
        if let Some(replicas) = role.replicas {
            replicas.get_or_insert(1);
        }
        if let Some(suffix) = role.suffix {
            if suffix.as_deref().map_or(true, str::is_empty) {
                *suffix = Some(role.name.to_string());
            }
        }
        default_pod_template(role.pod_template, entry, descriptor, &name, role.coordinator);
    }

    set_health_checker_defaults(&mut db.common_mut().health_checker, descriptor.failure_threshold);
    db.apply_tls_defaults(entry);
    if let Some(monitor) = db.common_mut().monitor.as_mut() {
        set_monitor_defaults(monitor, entry);
    }

    debug!(event = "Defaulted", kind = descriptor.kind, name = %name, version = %entry.name);

    Ok(())
}

fn set_service_account(template: &mut PodTemplateSpec, name: &str) {
    if template.spec.service_account_name.as_deref().map_or(true, str::is_empty) {
        template.spec.service_account_name = Some(name.to_string());
    }
}

/// Default one pod template: service account, pod security context and the
/// containers the kind runs in it.
pub fn default_pod_template(
    template: &mut PodTemplateSpec,
    entry: &VersionCatalogEntry,
    descriptor: &KindDescriptor,
    service_account: &str,
    coordinator: bool,
) {
    set_service_account(template, service_account);
    set_pod_security_context(template.spec.security_context.get_or_insert_with(PodSecurityContext::default), entry);

    if let Some(init) = descriptor.init_container {
        let container = ensure_container(&mut template.spec.init_containers, init);
        set_container_defaults(container, entry, ResourceProfile::InitContainer);
    }

    let container = ensure_container(&mut template.spec.containers, descriptor.container);
    set_container_defaults(container, entry, descriptor.resource_profile);

    if coordinator {
        if let Some(coordinator) = descriptor.coordinator_container {
            let container = ensure_container(&mut template.spec.containers, coordinator);
            set_container_defaults(container, entry, ResourceProfile::Coordinator);
        }
    }
}

fn set_pod_security_context(context: &mut PodSecurityContext, entry: &VersionCatalogEntry) {
    if context.fs_group.is_none() {
        context.fs_group = entry.run_as_user();
    }
}

pub fn set_container_defaults(container: &mut Container, entry: &VersionCatalogEntry, profile: ResourceProfile) {
    assign_container_security_context(container.security_context.get_or_insert_with(SecurityContext::default), entry);
    set_default_resources(container.resources.get_or_insert_with(ResourceRequirements::default), profile);
}

/// Find the named container, appending an empty one when it is missing.
pub fn ensure_container<'a>(containers: &'a mut Vec<Container>, name: &str) -> &'a mut Container {
    let index = match containers.iter().position(|c| c.name == name) {
        Some(index) => index,
        None => {
            containers.push(Container { name: name.to_string(), ..Default::default() });
            containers.len() - 1
        },
    };
    &mut containers[index]
}

pub fn assign_container_security_context(context: &mut SecurityContext, entry: &VersionCatalogEntry) {
    context.allow_privilege_escalation.get_or_insert(false);
    context.capabilities.get_or_insert_with(|| Capabilities {
        drop: Some(vec!["ALL".to_string()]),
        ..Default::default()
    });
    context.run_as_non_root.get_or_insert(true);
    if context.run_as_user.is_none() {
        context.run_as_user = entry.run_as_user();
    }
    if context.run_as_group.is_none() {
        context.run_as_group = entry.run_as_group();
    }
    context.seccomp_profile.get_or_insert_with(|| SeccompProfile {
        type_: "RuntimeDefault".to_string(),
        ..Default::default()
    });
}

/// Apply the profile only when neither requests nor limits were given.
pub fn set_default_resources(resources: &mut ResourceRequirements, profile: ResourceProfile) {
    let unset = resources.requests.as_ref().map_or(true, |r| r.is_empty())
        && resources.limits.as_ref().map_or(true, |l| l.is_empty());
    if unset {
        let defaults = profile.requirements();
        resources.requests = defaults.requests;
        resources.limits = defaults.limits;
    }
}

pub fn set_health_checker_defaults(health_checker: &mut HealthCheckSpec, failure_threshold: i32) {
    health_checker.period_seconds.get_or_insert(DEFAULT_HEALTH_CHECK_PERIOD_SECONDS);
    health_checker.timeout_seconds.get_or_insert(DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS);
    health_checker.failure_threshold.get_or_insert(failure_threshold);
}

pub fn set_monitor_defaults(monitor: &mut AgentSpec, entry: &VersionCatalogEntry) {
    let Some(prometheus) = monitor.prometheus.as_mut() else { return };

    prometheus.exporter.port.get_or_insert(PROMETHEUS_EXPORTER_PORT);
    if monitor.agent.as_deref() == Some(PROMETHEUS_OPERATOR_AGENT) {
        let service_monitor = prometheus.service_monitor.get_or_insert_with(Default::default);
        service_monitor.interval.get_or_insert_with(|| SERVICE_MONITOR_INTERVAL.to_string());
    }

    let context = &mut prometheus.exporter.security_context;
    if context.run_as_user.is_none() {
        context.run_as_user = entry.run_as_user();
    }
    if context.run_as_group.is_none() {
        context.run_as_group = entry.run_as_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VersionSecurityContext;
    use crate::crd::common::PrometheusSpec;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn entry() -> VersionCatalogEntry {
        VersionCatalogEntry {
            name: "8.0.35".to_string(),
            version: "8.0.35".to_string(),
            security_context: VersionSecurityContext { run_as_user: Some(999), run_as_group: None },
            ..Default::default()
        }
    }

    #[test]
    fn test_security_context_fills_gaps_only() {
        let mut context = SecurityContext { run_as_user: Some(1000), ..Default::default() };

        assign_container_security_context(&mut context, &entry());

        assert_eq!(context.run_as_user, Some(1000));
        assert_eq!(context.run_as_group, Some(999));
        assert_eq!(context.run_as_non_root, Some(true));
        assert_eq!(context.allow_privilege_escalation, Some(false));
        assert_eq!(context.capabilities.unwrap().drop, Some(vec!["ALL".to_string()]));
        assert_eq!(context.seccomp_profile.unwrap().type_, "RuntimeDefault");
    }

    #[test]
    fn test_resources_only_when_both_absent() {
        let mut resources = ResourceRequirements {
            limits: Some(BTreeMap::from([("memory".to_string(), Quantity("2Gi".to_string()))])),
            ..Default::default()
        };

        set_default_resources(&mut resources, ResourceProfile::Database);
        assert!(resources.requests.is_none());

        let mut resources = ResourceRequirements::default();
        set_default_resources(&mut resources, ResourceProfile::Database);
        assert_eq!(resources, ResourceProfile::Database.requirements());
    }

    #[test]
    fn test_ensure_container_is_stable() {
        let mut containers = vec![Container { name: "sidecar".to_string(), ..Default::default() }];

        ensure_container(&mut containers, "mysql").image = Some("mysql:8".to_string());
        ensure_container(&mut containers, "mysql");

        assert_eq!(containers.len(), 2);
        assert_eq!(containers[1].image.as_deref(), Some("mysql:8"));
    }

    #[test]
    fn test_monitor_defaults() {
        let mut monitor = AgentSpec {
            agent: Some(PROMETHEUS_OPERATOR_AGENT.to_string()),
            prometheus: Some(PrometheusSpec::default()),
        };

        set_monitor_defaults(&mut monitor, &entry());

        let prometheus = monitor.prometheus.unwrap();
        assert_eq!(prometheus.exporter.port, Some(56790));
        assert_eq!(prometheus.exporter.security_context.run_as_user, Some(999));
        assert_eq!(prometheus.service_monitor.unwrap().interval.as_deref(), Some("10s"));
    }

    #[test]
    fn test_health_checker_keeps_user_values() {
        let mut health_checker = HealthCheckSpec { period_seconds: Some(30), ..Default::default() };

        set_health_checker_defaults(&mut health_checker, 3);

        assert_eq!(health_checker.period_seconds, Some(30));
        assert_eq!(health_checker.timeout_seconds, Some(10));
        assert_eq!(health_checker.failure_threshold, Some(3));
    }
}
