// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_DATABASE, POSTGRES_CONTAINER_NAME, POSTGRES_COORDINATOR_CONTAINER_NAME, POSTGRES_INIT_CONTAINER_NAME, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::validation::{FieldErrorList, spec_path};

pub static POSTGRES_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "Postgres",
    plural: "postgreses",
    singular: "postgres",
    short_code: "pg",
    container: POSTGRES_CONTAINER_NAME,
    init_container: Some(POSTGRES_INIT_CONTAINER_NAME),
    coordinator_container: Some(POSTGRES_COORDINATOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "Postgres",
    group = "kubedb.com",
    version = "v1",
    plural = "postgreses",
    shortname = "pg",
    status = "DatabaseStatus",
    doc = "Postgres is a specification for a PostgreSQL database managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standby_mode: Option<PostgresStandbyMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_mode: Option<PostgresStreamingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Leader election settings of the coordinator
    pub leader_election: Option<PostgresLeaderElectionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// How much WAL the primary keeps around for its standbys
    pub replication: Option<PostgresReplication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<PostgresSSLMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_auth_mode: Option<PostgresClientAuthMode>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum PostgresStandbyMode {
    Hot,
    Warm,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum PostgresStreamingMode {
    Synchronous,
    Asynchronous,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PostgresSSLMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostgresClientAuthMode {
    Md5,
    Scram,
    Cert,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PostgresLeaderElectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_lag_before_failover: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub election_tick: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_tick: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_leadership_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_leadership_timeout: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum WalLimitPolicy {
    WALKeepSize,
    ReplicationSlot,
    WALKeepSegment,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PostgresReplication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wal_limit_policy: Option<WalLimitPolicy>,
    #[serde(rename = "walKeepSize", skip_serializing_if = "Option::is_none")]
    pub wal_keep_size_in_megabytes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wal_keep_segment: Option<i32>,
    #[serde(rename = "maxSlotWALKeepSize", skip_serializing_if = "Option::is_none")]
    pub max_slot_wal_keep_size_in_megabytes: Option<i32>,
}

/// Major version of a catalog version string, e.g. `16` for `16.1`.
fn major_version(version: &str) -> Option<u64> {
    version.split('.').next().and_then(|major| major.trim_start_matches('v').parse().ok())
}

impl Postgres {
    fn set_leader_election_defaults(&mut self) {
        let election = self.spec.leader_election.get_or_insert_with(|| PostgresLeaderElectionConfig {
            maximum_lag_before_failover: Some(64 * 1024 * 1024),
            period: Some("300ms".to_string()),
            election_tick: Some(10),
            heartbeat_tick: Some(1),
            ..Default::default()
        });
        election.transfer_leadership_interval.get_or_insert_with(|| "1s".to_string());
        election.transfer_leadership_timeout.get_or_insert_with(|| "60s".to_string());
    }

    /// Servers up to 12 only understand `wal_keep_segments`.
    fn set_replication_defaults(&mut self, entry: &VersionCatalogEntry) {
        let major = major_version(&entry.version).unwrap_or_default();
        let replication = self.spec.replication.get_or_insert_with(PostgresReplication::default);

        let policy = *replication.wal_limit_policy.get_or_insert(if major <= 12 {
            WalLimitPolicy::WALKeepSegment
        } else {
            WalLimitPolicy::WALKeepSize
        });
        match policy {
            WalLimitPolicy::WALKeepSegment => {
                replication.wal_keep_segment.get_or_insert(96);
            },
            WalLimitPolicy::WALKeepSize => {
                replication.wal_keep_size_in_megabytes.get_or_insert(1536);
            },
            WalLimitPolicy::ReplicationSlot => {
                replication.max_slot_wal_keep_size_in_megabytes.get_or_insert(-1);
            },
        }
    }
}

impl Database for Postgres {
    fn descriptor(&self) -> &'static KindDescriptor {
        &POSTGRES_DESCRIPTOR
    }

    fn common(&self) -> &DatabaseCommonSpec {
        &self.spec.common
    }

    fn common_mut(&mut self) -> &mut DatabaseCommonSpec {
        &mut self.spec.common
    }

    fn topology(&self) -> TopologyShape {
        TopologyShape::from_replicas(self.spec.common.replicas)
    }

    /// The coordinator runs even for a single server, it drives failover.
    fn uses_coordinator(&self) -> bool {
        true
    }

    fn apply_kind_defaults(&mut self, entry: &VersionCatalogEntry) {
        self.spec.standby_mode.get_or_insert(PostgresStandbyMode::Hot);
        let ssl_mode = if self.spec.common.tls.is_some() {
            PostgresSSLMode::VerifyFull
        } else {
            PostgresSSLMode::Disable
        };
        self.spec.ssl_mode.get_or_insert(ssl_mode);
        self.spec.client_auth_mode.get_or_insert(PostgresClientAuthMode::Md5);

        self.set_leader_election_defaults();
        self.set_replication_defaults(entry);
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        let tls = self.spec.common.tls.is_some();

        if !tls {
            match self.spec.ssl_mode {
                Some(mode @ (PostgresSSLMode::Require | PostgresSSLMode::VerifyCa | PostgresSSLMode::VerifyFull)) => {
                    errors.invalid(
                        spec_path().child("sslMode"),
                        format!("{:?}", mode),
                        "sslMode needs spec.tls to be set",
                    );
                },
                _ => {},
            }
            if self.spec.client_auth_mode == Some(PostgresClientAuthMode::Cert) {
                errors.invalid(
                    spec_path().child("clientAuthMode"),
                    "cert",
                    "clientAuthMode cert needs spec.tls to be set",
                );
            }
        }

        if let Some(election) = self.spec.leader_election.as_ref() {
            if let (Some(election_tick), Some(heartbeat_tick)) = (election.election_tick, election.heartbeat_tick) {
                if election_tick <= heartbeat_tick {
                    errors.invalid(
                        spec_path().child("leaderElection").child("electionTick"),
                        election_tick,
                        "electionTick must be greater than heartbeatTick",
                    );
                }
            }
        }
    }
}
