// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

#[allow(unused_extern_crates)]
extern crate self as kubedb_api;

pub mod catalog;
pub mod constants;
pub mod crd;
pub mod defaults;
pub mod error;
pub mod meta;
pub mod naming;
pub mod readiness;
pub mod tls;
pub mod validation;

pub use crate::catalog::{InMemoryVersionCatalog, VersionCatalog, VersionCatalogEntry};
pub use crate::crd::Database;
pub use crate::crd::any::AnyDatabase;
pub use crate::error::{ApiError, Result};
pub use crate::naming::{DerivedNames, Offshoot};
pub use crate::readiness::{InMemoryWorkloadLister, ReplicaReadiness, WorkloadLister};
