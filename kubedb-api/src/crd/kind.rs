// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;

use crate::constants::{GROUP_NAME, ResourceProfile};
use crate::crd::common::{PodTemplateSpec, RoleSpec};

/// Static facts about a database kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: &'static str,
    pub plural: &'static str,
    pub singular: &'static str,
    pub short_code: &'static str,
    pub container: &'static str,
    pub init_container: Option<&'static str>,
    pub coordinator_container: Option<&'static str>,
    /// Value of the `app.kubernetes.io/component` label
    pub component: &'static str,
    pub resource_profile: ResourceProfile,
    pub certificate_aliases: &'static [&'static str],
    pub failure_threshold: i32,
}

impl KindDescriptor {
    /// Fully qualified resource name, e.g. `mysqls.kubedb.com`.
    pub fn resource_fqn(&self) -> String {
        format!("{}.{}", self.plural, GROUP_NAME)
    }
}

/// How the workloads of a database are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyShape {
    Standalone,
    Replicated { replicas: i32 },
    /// One workload per node role
    Clustered { roles: Vec<String> },
    /// One workload per shard plus one per auxiliary role
    Sharded { shards: i32, auxiliary: Vec<String> },
}

impl TopologyShape {
    pub fn workload_count(&self) -> usize {
        match self {
            TopologyShape::Standalone | TopologyShape::Replicated { .. } => 1,
            TopologyShape::Clustered { roles } => roles.len(),
            TopologyShape::Sharded { shards, auxiliary } => {
                usize::try_from(*shards).unwrap_or_default() + auxiliary.len()
            },
        }
    }

    /// Whether `spec.replicas` is superseded by per-role settings.
    pub fn is_divided(&self) -> bool {
        matches!(self, TopologyShape::Clustered { .. } | TopologyShape::Sharded { .. })
    }

    pub fn from_replicas(replicas: Option<i32>) -> Self {
        match replicas {
            Some(replicas) if replicas > 1 => TopologyShape::Replicated { replicas },
            _ => TopologyShape::Standalone,
        }
    }
}

/// Read access to one node role of a divided topology.
#[derive(Debug, Clone, Copy)]
pub struct RoleRef<'a> {
    pub name: &'static str,
    pub replicas: Option<i32>,
    pub suffix: Option<&'a str>,
    pub storage: Option<&'a PersistentVolumeClaimSpec>,
    pub pod_template: &'a PodTemplateSpec,
}

impl RoleRef<'_> {
    /// The suffix, falling back to the role name.
    pub fn effective_suffix(&self) -> &str {
        self.suffix.filter(|s| !s.is_empty()).unwrap_or(self.name)
    }
}

/// Mutable access to one node role, handed to the defaulter. Fields a role
/// does not carry are `None`.
#[derive(Debug)]
pub struct RoleMut<'a> {
    pub name: &'static str,
    pub replicas: Option<&'a mut Option<i32>>,
    pub suffix: Option<&'a mut Option<String>>,
    pub pod_template: &'a mut PodTemplateSpec,
    /// Run the coordinator sidecar in this role's pods
    pub coordinator: bool,
}

impl RoleSpec {
    pub fn role_ref(&self, name: &'static str) -> RoleRef<'_> {
        RoleRef {
            name,
            replicas: self.replicas,
            suffix: self.suffix.as_deref(),
            storage: self.storage.as_ref(),
            pod_template: &self.pod_template,
        }
    }

    pub fn role_mut(&mut self, name: &'static str) -> RoleMut<'_> {
        RoleMut {
            name,
            replicas: Some(&mut self.replicas),
            suffix: Some(&mut self.suffix),
            pod_template: &mut self.pod_template,
            coordinator: false,
        }
    }
}
