// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::VersionCatalogEntry;
use crate::constants::{
    COMPONENT_DATABASE, MARIADB_CONTAINER_NAME, MARIADB_COORDINATOR_CONTAINER_NAME, MARIADB_INIT_CONTAINER_NAME, ResourceProfile,
};
use crate::crd::{Database, common::{DatabaseCommonSpec, DatabaseStatus}};
use crate::crd::kind::{KindDescriptor, TopologyShape};
use crate::validation::{FieldErrorList, spec_path};

pub static MARIADB_DESCRIPTOR: KindDescriptor = KindDescriptor {
    kind: "MariaDB",
    plural: "mariadbs",
    singular: "mariadb",
    short_code: "md",
    container: MARIADB_CONTAINER_NAME,
    init_container: Some(MARIADB_INIT_CONTAINER_NAME),
    coordinator_container: Some(MARIADB_COORDINATOR_CONTAINER_NAME),
    component: COMPONENT_DATABASE,
    resource_profile: ResourceProfile::Database,
    certificate_aliases: &["server", "client", "metrics-exporter"],
    failure_threshold: 1,
};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    kind = "MariaDB",
    group = "kubedb.com",
    version = "v1",
    plural = "mariadbs",
    shortname = "md",
    status = "DatabaseStatus",
    doc = "MariaDB is a specification for a MariaDB database or Galera cluster managed by KubeDB.",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MariaDBSpec {
    #[serde(flatten)]
    pub common: DatabaseCommonSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// State snapshot transfer method of the Galera cluster
    pub wsrep_sst_method: Option<GaleraWsrepSSTMethod>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[serde(rename = "requireSSL")]
    pub require_ssl: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GaleraWsrepSSTMethod {
    Rsync,
    Mariabackup,
}

impl MariaDB {
    /// More than one server forms a Galera cluster.
    pub fn is_cluster(&self) -> bool {
        self.spec.common.replicas.unwrap_or(1) > 1
    }
}

impl Database for MariaDB {
    fn descriptor(&self) -> &'static KindDescriptor {
        &MARIADB_DESCRIPTOR
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

    fn uses_coordinator(&self) -> bool {
        self.is_cluster()
    }

    fn apply_kind_defaults(&mut self, _entry: &VersionCatalogEntry) {
        if self.is_cluster() {
            self.spec.wsrep_sst_method.get_or_insert(GaleraWsrepSSTMethod::Rsync);
        }
    }

    fn validate_kind(&self, errors: &mut FieldErrorList) {
        if self.spec.require_ssl && self.spec.common.tls.is_none() {
            errors.invalid(spec_path().child("requireSSL"), true, "requireSSL needs spec.tls to be set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::v1::testing::entry;
    use crate::defaults::apply_defaults;

    fn mariadb(replicas: Option<i32>) -> MariaDB {
        MariaDB::new("md", MariaDBSpec {
            common: DatabaseCommonSpec { version: "10.11.2".to_string(), replicas, ..Default::default() },
            ..Default::default()
        })
    }

    fn container_names(db: &MariaDB) -> Vec<&str> {
        db.spec.common.pod_template.spec.containers.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_single_server_has_no_coordinator() {
        let mut db = mariadb(None);

        apply_defaults(&mut db, &entry("10.11.2", 999)).unwrap();

        assert_eq!(db.spec.common.replicas, Some(1));
        assert_eq!(container_names(&db), vec!["mariadb"]);
        assert_eq!(db.spec.wsrep_sst_method, None);
        assert_eq!(db.spec.common.pod_template.spec.init_containers[0].name, "mariadb-init");
    }

    #[test]
    fn test_cluster_runs_coordinator() {
        let mut db = mariadb(Some(3));

        apply_defaults(&mut db, &entry("10.11.2", 999)).unwrap();

        assert_eq!(container_names(&db), vec!["mariadb", "md-coordinator"]);
        assert_eq!(db.spec.wsrep_sst_method, Some(GaleraWsrepSSTMethod::Rsync));
        let coordinator = &db.spec.common.pod_template.spec.containers[1];
        assert_eq!(coordinator.resources, Some(ResourceProfile::Coordinator.requirements()));
    }

    #[test]
    fn test_require_ssl_needs_tls() {
        let mut db = mariadb(Some(1));
        db.spec.require_ssl = true;
        let mut errors = FieldErrorList::default();

        db.validate_kind(&mut errors);

        assert!(errors.has_path("spec.requireSSL"));
    }
}
