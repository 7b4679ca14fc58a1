// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::api::core::v1::Sysctl;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{AuthPlugin, VersionCatalogEntry};
use crate::constants::{
    COMPONENT_DATABASE, ELASTICSEARCH_CONTAINER_NAME, ELASTICSEARCH_INIT_CONTAINER_NAME, ELASTICSEARCH_MAX_MAP_COUNT,
    ELASTICSEARCH_MAX_MAP_COUNT_SYSCTL, ELASTICSEARCH_NODE_ROLE_SET, ELASTICSEARCH_REST_PORT, GROUP_NAME,
    KUBEDB_ORGANIZATION, ResourceProfile,
};
use crate::crd::{Database, common::{
    CertificatePrivateKey, CertificateSpec, DatabaseCommonSpec, DatabaseStatus, PrivateKeyEncoding, RoleSpec,
    SecretReference, StorageType, TlsConfig, X509Subject,
}};
use crate::crd::kind::{KindDescriptor, RoleMut, RoleRef, TopologyShape};
use crate::meta::name_with_suffix;
use crate::naming::Offshoot;
use crate::tls::{certificate_name, remove_certificate, set_missing_spec_for_certificate};
use crate::validation::{FieldErrorList, spec_path};

pub const ELASTICSEARCH_CA_CERT: &str = "ca";
pub const ELASTICSEARCH_TRANSPORT_CERT: &str = "transport";
pub const ELASTICSEARCH_HTTP_CERT: &str = "http";
pub const ELASTICSEARCH_ADMIN_CERT: &str = "admin";
pub const ELASTICSEARCH_CLIENT_CERT: &str = "client";
pub const ELASTICSEARCH_ARCHIVER_CERT: &str = "archiver";
pub const ELASTICSEARCH_METRICS_EXPORTER_CERT: &str = "metrics-exporter";

pub const ELASTICSEARCH_USER_ELASTIC: &str = "elastic";
pub const ELASTICSEARCH_USER_ADMIN: &str = "admin";
pub const ELASTICSEARCH_USER_KIBANASERVER: &str = "kibanaserver";
pub const ELASTICSEARCH_USER_KIBANA_SYSTEM: &str = "kibana_system";
pub const ELASTICSEARCH_USER_LOGSTASH_SYSTEM: &str = "logstash_system";
pub const ELASTICSEARCH_USER_BEATS_SYSTEM: &str = "beats_system";
pub const ELASTICSEARCH_USER_APM_SYSTEM: &str = "apm_system";
pub const ELASTICSEARCH_USER_REMOTE_MONITORING: &str = "remote_monitoring_user";
pub const ELASTICSEARCH_USER_KIBANARO: &str = "kibanaro";
pub const ELASTICSEARCH_USER_LOGSTASH: &str = "logstash";
pub const ELASTICSEARCH_USER_READALL: &str = "readall";
pub const ELASTICSEARCH_USER_SNAPSHOTRESTORE: &str = "snapshotrestore";
pub const ELASTICSEARCH_USER_METRICS_EXPORTER: &str = "metrics_exporter";

/// Role the metrics exporter reads cluster stats with. Search Guard 6 spells it differently.
pub const ELASTICSEARCH_READALL_MONITOR_ROLE: &str = "readall_and_monitor";
pub const ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V6: &str = "sg_readall_and_monitor";
pub const ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V7: &str = "SGS_READALL_AND_MONITOR";

pub static ELASTICSEARCH_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "Elasticsearch",
    plural: "elasticsearches",
    singular: "elasticsearch",
    short_code: "es",
    container: ELASTICSEARCH_CONTAINER_NAME,
    init_container: Some(ELASTICSEARCH_INIT_CONTAINER_NAME),
    coordinator_container: None,
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::MemoryIntensive,
    certificate_aliases: &[
        ELASTICSEARCH_CA_CERT,
        ELASTICSEARCH_TRANSPORT_CERT,
        ELASTICSEARCH_ADMIN_CERT,
        ELASTICSEARCH_HTTP_CERT,
        ELASTICSEARCH_METRICS_EXPORTER_CERT,
        ELASTICSEARCH_CLIENT_CERT,
    ],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Elasticsearch",
    group = "kubedb.com",
    version = "v1",
    plural = "elasticsearches",
    shortname = "es",
    status = "DatabaseStatus",
    doc = "Elasticsearch is a specification for an Elasticsearch or OpenSearch cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<ElasticsearchClusterTopology>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[serde(rename = "enableSSL")]
    /// Serve the REST layer over TLS. The transport layer always uses TLS.
    pub enable_ssl: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    /// Turn off the security plugin, and with it every certificate
    pub disable_security: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_settings: Option<KernelSettings>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    /// Users of the security plugin, keyed by user name
    pub internal_users: BTreeMap<String, ElasticsearchUserSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    /// Security plugin roles mapped to users, hosts and backend roles
    pub roles_mapping: BTreeMap<String, ElasticsearchRoleMapSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ElasticsearchUserSpec {
    #[serde(rename = "full_name", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    /// X-Pack roles of the user
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Secret holding the credentials, `<name>-<user>-cred` by default
    pub secret_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reserved: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backend_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_guard_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opendistro_security_roles: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ElasticsearchRoleMapSpec {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reserved: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backend_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub and_backend_roles: Vec<String>,
}

/// Dedicated node groups. `master` and `ingest` always exist.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchClusterTopology {
    pub master: RoleSpec,
    pub ingest: RoleSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_content: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hot: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_warm: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_cold: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_frozen: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<RoleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinating: Option<RoleSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KernelSettings {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    /// Run the sysctl init container privileged
    pub privileged: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sysctls: Vec<Sysctl>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    /// Skip the default `vm.max_map_count` setting
    pub disable_defaults: bool,
}

/// A present node group: role name, field name and the node itself.
type Node<'a> = (&'static str, &'static str, &'a RoleSpec);

impl ElasticsearchClusterTopology {
    /// Present node groups, required ones first.
    pub fn nodes(&self) -> Vec<Node<'_>> {
        let optional = [
            ("data", "data", self.data.as_ref()),
            ("data-content", "dataContent", self.data_content.as_ref()),
            ("data-hot", "dataHot", self.data_hot.as_ref()),
            ("data-warm", "dataWarm", self.data_warm.as_ref()),
            ("data-cold", "dataCold", self.data_cold.as_ref()),
            ("data-frozen", "dataFrozen", self.data_frozen.as_ref()),
            ("ml", "ml", self.ml.as_ref()),
            ("transform", "transform", self.transform.as_ref()),
            ("coordinating", "coordinating", self.coordinating.as_ref()),
        ];
        let mut nodes = vec![("master", "master", &self.master), ("ingest", "ingest", &self.ingest)];
        nodes.extend(optional.into_iter().filter_map(|(role, field, node)| node.map(|n| (role, field, n))));
        nodes
    }

    fn nodes_mut(&mut self) -> Vec<(&'static str, &mut RoleSpec)> {
        let optional = [
            ("data", self.data.as_mut()),
            ("data-content", self.data_content.as_mut()),
            ("data-hot", self.data_hot.as_mut()),
            ("data-warm", self.data_warm.as_mut()),
            ("data-cold", self.data_cold.as_mut()),
            ("data-frozen", self.data_frozen.as_mut()),
            ("ml", self.ml.as_mut()),
            ("transform", self.transform.as_mut()),
            ("coordinating", self.coordinating.as_mut()),
        ];
        let mut nodes = vec![("master", &mut self.master), ("ingest", &mut self.ingest)];
        nodes.extend(optional.into_iter().filter_map(|(role, node)| node.map(|n| (role, n))));
        nodes
    }
}

impl Elasticsearch {
    pub fn master_discovery_service_name(&self) -> String {
        name_with_suffix(&self.service_name(), "master")
    }

    /// Workload of a node role, `None` when the role is not deployed.
    pub fn petset_name(&self, role: &str) -> Option<String> {
        let topology = self.spec.topology.as_ref()?;
        topology
            .nodes()
            .into_iter()
            .find(|(name, _, _)| *name == role)
            .map(|(name, _, node)| self.role_workload_name(&node.role_ref(name)))
    }

    /// Pod names that bootstrap the cluster, the master nodes in topology mode.
    pub fn initial_master_nodes(&self) -> Vec<String> {
        let (petset, replicas) = match self.spec.topology.as_ref() {
            Some(topology) => (
                self.role_workload_name(&topology.master.role_ref("master")),
                topology.master.replicas.unwrap_or(1),
            ),
            None => (self.offshoot_name(), self.spec.common.replicas.unwrap_or(1)),
        };
        (0..replicas.max(0)).map(|i| format!("{}-{}", petset, i)).collect()
    }

    pub fn node_role_label_key(&self, role: &str) -> String {
        format!("{}/role-{}", GROUP_NAME, role)
    }

    pub fn node_role_selectors(&self, role: &str) -> BTreeMap<String, String> {
        self.offshoot_selectors(&[&BTreeMap::from([(
            self.node_role_label_key(role),
            ELASTICSEARCH_NODE_ROLE_SET.to_string(),
        )])])
    }

    pub fn connection_scheme(&self) -> &'static str {
        if self.spec.enable_ssl { "https" } else { "http" }
    }

    pub fn connection_url(&self) -> String {
        format!(
            "{}://{}.{}:{}",
            self.connection_scheme(),
            self.offshoot_name(),
            self.namespace_or_default(),
            ELASTICSEARCH_REST_PORT
        )
    }

    /// Secret of an internal user, `_` in the user name becomes `-`.
    pub fn default_user_cred_secret_name(&self, user: &str) -> String {
        user_cred_secret_name(&self.name_any(), user)
    }

    pub fn cert_secret_volume_name(alias: &str) -> String {
        format!("{}-certs", alias)
    }

    pub fn cert_secret_volume_mount_path(config_dir: &str, alias: &str) -> String {
        format!("{}/certs/{}", config_dir.trim_end_matches('/'), alias)
    }

    /// Fill in the built-in users of the security plugin and map the metrics
    /// exporter to its monitoring role. Entries the user wrote are extended,
    /// never replaced.
    fn set_internal_user_defaults(&mut self, entry: &VersionCatalogEntry) {
        if self.spec.disable_security {
            return;
        }
        let Some((major, minor)) = major_minor(&entry.version) else { return };
        let monitored = self.spec.common.monitor.is_some();
        let users = &mut self.spec.internal_users;

        match entry.auth_plugin {
            // Internal users exist since 7.8.
            Some(AuthPlugin::XPack) if major >= 8 || (major == 7 && minor >= 8) => {
                upsert_backend_role(users, ELASTICSEARCH_USER_ELASTIC, "superuser", false);
                for (user, roles) in [
                    (ELASTICSEARCH_USER_KIBANA_SYSTEM, &["kibana_system"][..]),
                    (ELASTICSEARCH_USER_BEATS_SYSTEM, &["beats_system"][..]),
                    (ELASTICSEARCH_USER_APM_SYSTEM, &["apm_system"][..]),
                    (ELASTICSEARCH_USER_REMOTE_MONITORING, &["remote_monitoring_collector", "remote_monitoring_agent"][..]),
                    (ELASTICSEARCH_USER_LOGSTASH_SYSTEM, &["logstash_system"][..]),
                ] {
                    users.entry(user.to_string()).or_insert_with(|| ElasticsearchUserSpec {
                        backend_roles: roles.iter().map(|r| r.to_string()).collect(),
                        ..Default::default()
                    });
                }
            },
            Some(plugin) if plugin != AuthPlugin::XPack => {
                upsert_backend_role(users, ELASTICSEARCH_USER_ADMIN, "admin", true);
                users
                    .entry(ELASTICSEARCH_USER_KIBANASERVER.to_string())
                    .or_insert_with(|| ElasticsearchUserSpec { reserved: true, ..Default::default() });
                for user in [
                    ELASTICSEARCH_USER_KIBANARO,
                    ELASTICSEARCH_USER_LOGSTASH,
                    ELASTICSEARCH_USER_READALL,
                    ELASTICSEARCH_USER_SNAPSHOTRESTORE,
                ] {
                    users.entry(user.to_string()).or_default();
                }

                if monitored {
                    users.entry(ELASTICSEARCH_USER_METRICS_EXPORTER.to_string()).or_default();
                    let mapping = &mut self.spec.roles_mapping;
                    let role = match plugin {
                        AuthPlugin::SearchGuard if major == 6 => {
                            mapping.remove(ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V7);
                            ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V6
                        },
                        AuthPlugin::SearchGuard => {
                            mapping.remove(ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V6);
                            ELASTICSEARCH_SEARCH_GUARD_READALL_MONITOR_ROLE_V7
                        },
                        _ => ELASTICSEARCH_READALL_MONITOR_ROLE,
                    };
                    let users = &mut mapping.entry(role.to_string()).or_default().users;
                    if !users.iter().any(|u| u == ELASTICSEARCH_USER_METRICS_EXPORTER) {
                        users.push(ELASTICSEARCH_USER_METRICS_EXPORTER.to_string());
                    }
                }
            },
            _ => {},
        }

        self.set_internal_user_secret_names();
    }

    /// The superuser shares `spec.authSecret`; every other user gets its own
    /// credential secret.
    fn set_internal_user_secret_names(&mut self) {
        let name = self.name_any();
        let auth_secret = self.spec.common.auth_secret.as_ref().map(|s| s.name.clone()).filter(|n| !n.is_empty());
        let default_auth_secret = self.auth_secret_name();

        let mut superuser_secret = None;
        for (user, spec) in self.spec.internal_users.iter_mut() {
            if user == ELASTICSEARCH_USER_ADMIN || user == ELASTICSEARCH_USER_ELASTIC {
                let secret = match auth_secret.as_ref() {
                    Some(secret) => secret.clone(),
                    None => spec.secret_name.clone().filter(|n| !n.is_empty()).unwrap_or_else(|| default_auth_secret.clone()),
                };
                spec.secret_name = Some(secret.clone());
                superuser_secret = Some(secret);
            } else if spec.secret_name.as_deref().map_or(true, str::is_empty) {
                spec.secret_name = Some(user_cred_secret_name(&name, user));
            }
        }

        if let (None, Some(secret)) = (auth_secret, superuser_secret) {
            self.spec.common.auth_secret = Some(SecretReference { name: secret, ..Default::default() });
        }
    }

    fn set_kernel_defaults(&mut self) {
        let settings = self.spec.kernel_settings.get_or_insert_with(KernelSettings::default);
        if settings.disable_defaults {
            return;
        }
        settings.privileged = true;
        if !settings.sysctls.iter().any(|s| s.name == ELASTICSEARCH_MAX_MAP_COUNT_SYSCTL) {
            settings.sysctls.push(Sysctl {
                name: ELASTICSEARCH_MAX_MAP_COUNT_SYSCTL.to_string(),
                value: ELASTICSEARCH_MAX_MAP_COUNT.to_string(),
            });
        }
    }
}

impl Database for Elasticsearch {
    fn descriptor(&self) -> &'static KindDescriptor {
        &ELASTICSEARCH_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        match self.spec.topology.as_ref() {
            Some(topology) => TopologyShape::Clustered {
                roles: topology.nodes().into_iter().map(|(role, _, _)| role.to_string()).collect(),
            },
            None => TopologyShape::from_replicas(self.spec.common.replicas),
        }
    }

    /// The operator signs certificates with its own CA when no issuer is given.
    fn requires_tls_issuer(&self) -> bool {
        false
    }

    fn roles(&self) -> Vec<RoleRef<'_>> {
        self.spec
            .topology
            .as_ref()
            .map(|t| t.nodes().into_iter().map(|(role, _, node)| node.role_ref(role)).collect())
            .unwrap_or_default()
    }

    fn roles_mut(&mut self) -> Vec<RoleMut<'_>> {
        self.spec
            .topology
            .as_mut()
            .map(|t| t.nodes_mut().into_iter().map(|(role, node)| node.role_mut(role)).collect())
            .unwrap_or_default()
    }

    fn apply_kind_defaults(&mut self, entry: &VersionCatalogEntry) {
        self.set_kernel_defaults();
        self.set_internal_user_defaults(entry);
    }

    fn apply_tls_defaults(&mut self, entry: &VersionCatalogEntry) {
        if self.spec.disable_security {
            return;
        }
        let name = self.name_any();
        let enable_ssl = self.spec.enable_ssl;
        let monitored = self.spec.common.monitor.is_some();

        let tls = self.spec.common.tls.get_or_insert_with(TlsConfig::default);
        let mut aliases = Vec::new();
        if tls.issuer_ref.is_none() {
            aliases.push(ELASTICSEARCH_CA_CERT);
        }
        aliases.push(ELASTICSEARCH_TRANSPORT_CERT);
        if entry.auth_plugin.is_some_and(|plugin| plugin.needs_admin_certificate()) {
            aliases.push(ELASTICSEARCH_ADMIN_CERT);
        }
        if enable_ssl {
            aliases.push(ELASTICSEARCH_HTTP_CERT);
            if monitored {
                aliases.push(ELASTICSEARCH_METRICS_EXPORTER_CERT);
            }
            aliases.push(ELASTICSEARCH_CLIENT_CERT);
        }

        for alias in aliases {
            set_missing_spec_for_certificate(&mut tls.certificates, CertificateSpec {
                alias: alias.to_string(),
                secret_name: Some(certificate_name(&name, alias)),
                ..Default::default()
            });
        }
        remove_certificate(&mut tls.certificates, ELASTICSEARCH_ARCHIVER_CERT);

        for cert in tls.certificates.iter_mut() {
            cert.private_key = Some(CertificatePrivateKey { encoding: PrivateKeyEncoding::PKCS8 });
            cert.subject.get_or_insert_with(|| X509Subject {
                organizations: vec![KUBEDB_ORGANIZATION.to_string()],
                ..Default::default()
            });
        }
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let spec = &self.spec;

        if spec.disable_security && spec.enable_ssl {
            errors.invalid(spec_path().child("enableSSL"), true, "enableSSL needs security to be enabled");
        }

        let Some(topology) = spec.topology.as_ref() else { return };
        let path = spec_path().child("topology");

        if spec.common.storage.is_some() {
            errors.forbidden(spec_path().child("storage"), "use the storage of each node when spec.topology is set");
        }

        let mut suffixes = BTreeSet::new();
        for (role, field, node) in topology.nodes() {
            let node_path = path.child(field);
            let node_ref = node.role_ref(role);
            if let Some(replicas) = node.replicas.filter(|r| *r <= 0) {
                errors.invalid(node_path.child("replicas"), replicas, "replicas of a node must be at least 1");
            }
            if !suffixes.insert(node_ref.effective_suffix().to_string()) {
                errors.invalid(node_path.child("suffix"), node_ref.effective_suffix(), "two nodes can not have the same suffix");
            }
            if spec.common.storage_type == Some(StorageType::Durable) && node.storage.is_none() {
                errors.required(node_path.child("storage"), "durable nodes need storage");
            }
        }
    }
}

fn user_cred_secret_name(name: &str, user: &str) -> String {
    name_with_suffix(name, &format!("{}-cred", user).replace('_', "-"))
}

/// Add the user if missing, and make sure it carries `role`.
fn upsert_backend_role(users: &mut BTreeMap<String, ElasticsearchUserSpec>, user: &str, role: &str, reserved: bool) {
    let spec = users
        .entry(user.to_string())
        .or_insert_with(|| ElasticsearchUserSpec { reserved, ..Default::default() });
    if !spec.backend_roles.iter().any(|r| r == role) {
        spec.backend_roles.push(role.to_string());
    }
}

/// Major and minor number of a catalog version such as `8.11.1`.
fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major, minor))
}
