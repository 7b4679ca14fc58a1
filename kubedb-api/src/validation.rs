// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::ResourceExt;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::catalog::VersionCatalog;
use crate::crd::{Database, common::{DeletionPolicy, StorageType}};
use crate::error::{ApiError, Result};

/// Dotted path to a field, e.g. `spec.topology.broker.replicas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(root: &str) -> Self {
        FieldPath(root.to_string())
    }

    pub fn child(&self, name: &str) -> Self {
        FieldPath(format!("{}.{}", self.0, name))
    }

    pub fn index(&self, index: usize) -> Self {
        FieldPath(format!("{}[{}]", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Path rooted at `spec`.
pub fn spec_path() -> FieldPath {
    FieldPath::new("spec")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Invalid,
    Required,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub path: FieldPath,
    pub value: Option<String>,
    pub detail: String,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match (self.kind, &self.value) {
            (FieldErrorKind::Invalid, Some(value)) => {
                write!(f, "{}: Invalid value: {:?}: {}", self.path, value, self.detail)
            },
            (FieldErrorKind::Invalid, None) => write!(f, "{}: Invalid value: {}", self.path, self.detail),
            (FieldErrorKind::Required, _) => write!(f, "{}: Required value: {}", self.path, self.detail),
            (FieldErrorKind::Forbidden, _) => write!(f, "{}: Forbidden: {}", self.path, self.detail),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrorList(Vec<FieldError>);

impl FieldErrorList {
    pub fn invalid(&mut self, path: FieldPath, value: impl ToString, detail: impl Into<String>) {
        self.0.push(FieldError {
            kind: FieldErrorKind::Invalid,
            path,
            value: Some(value.to_string()),
            detail: detail.into(),
        });
    }

    pub fn required(&mut self, path: FieldPath, detail: impl Into<String>) {
        self.0.push(FieldError { kind: FieldErrorKind::Required, path, value: None, detail: detail.into() });
    }

    pub fn forbidden(&mut self, path: FieldPath, detail: impl Into<String>) {
        self.0.push(FieldError { kind: FieldErrorKind::Forbidden, path, value: None, detail: detail.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether any error points at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path.as_str() == path)
    }

    /// `Ok` when empty, otherwise one aggregated `Invalid` error.
    pub fn into_result(self, kind: &'static str, name: String) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        Err(ApiError::Invalid { kind, name, errors: self })
    }
}

impl Display for FieldErrorList {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let joined = self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "[{}]", joined)
    }
}

/// Run the common checks and the kind's own checks. Either everything passes
/// or a single `ApiError::Invalid` carries every violation.
pub fn validate_create_or_update<D: Database>(db: &D, catalog: &dyn VersionCatalog) -> Result<()> {
    let mut errors = FieldErrorList::default();
    let common = db.common();
    let spec = spec_path();

    if common.version.is_empty() {
        errors.required(spec.child("version"), "version can not be empty");
    } else {
        match catalog.get(&common.version).and_then(|entry| entry.ensure_supported()) {
            Ok(()) => {},
            Err(e) => errors.invalid(spec.child("version"), &common.version, e.to_string()),
        }
    }

    let divided = db.topology().is_divided();
    match common.replicas {
        Some(_) if divided => {
            errors.forbidden(spec.child("replicas"), "replicas can not be set together with a topology");
        },
        Some(replicas) if replicas <= 0 => {
            errors.invalid(spec.child("replicas"), replicas, "number of replicas can not be 0 or less");
        },
        _ => {},
    }

    match common.storage_type {
        _ if !db.has_storage() => {
            if common.storage_type.is_some() {
                errors.forbidden(spec.child("storageType"), "storageType is not used by this kind");
            }
            if common.storage.is_some() {
                errors.forbidden(spec.child("storage"), "storage is not used by this kind");
            }
        },
        None => errors.required(spec.child("storageType"), "storageType can not be empty"),
        Some(StorageType::Durable) => {
            if db.requires_storage() && common.storage.is_none() {
                errors.required(spec.child("storage"), "storage is required for Durable storage type");
            }
        },
        Some(StorageType::Ephemeral) => {
            if common.storage.is_some() {
                errors.forbidden(spec.child("storage"), "storage can not be set for Ephemeral storage type");
            }
            if common.deletion_policy == Some(DeletionPolicy::Halt) {
                errors.invalid(
                    spec.child("deletionPolicy"),
                    DeletionPolicy::Halt,
                    "'spec.deletionPolicy: Halt' can not be used for 'Ephemeral' storage",
                );
            }
        },
    }
    if !db.uses_main_pod_template() && common.storage.is_some() {
        errors.forbidden(spec.child("storage"), "spec.storage is not used when a topology is set");
    }

    match common.deletion_policy {
        None => errors.required(spec.child("deletionPolicy"), "deletionPolicy can not be empty"),
        Some(DeletionPolicy::DoNotTerminate) if common.halted => {
            errors.invalid(spec.child("halted"), true, "can't halt if deletionPolicy is set to \"DoNotTerminate\"");
        },
        _ => {},
    }

    if let Some(tls) = common.tls.as_ref() {
        if tls.issuer_ref.is_none() && !tls.certificates.is_empty() && db.requires_tls_issuer() {
            errors.required(spec.child("tls").child("issuerRef"), "issuerRef is required when certificates are listed");
        }
    }

    db.validate_kind(&mut errors);

    errors.into_result(db.descriptor().kind, db.name_any())
}

/// Deleting is refused while the deletion policy is `DoNotTerminate`.
pub fn validate_delete<D: Database>(db: &D) -> Result<()> {
    if db.common().deletion_policy == Some(DeletionPolicy::DoNotTerminate) {
        return Err(ApiError::DeletionForbidden { kind: db.descriptor().kind, name: db.name_any() });
    }
    Ok(())
}
