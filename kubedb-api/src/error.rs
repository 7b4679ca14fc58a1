// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::result;
use thiserror::Error;

use crate::validation::FieldErrorList;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("version lookup failed for {version}: {reason}")]
    VersionLookup { version: String, reason: String },
    #[error("version {0} is deprecated")]
    DeprecatedVersion(String),
    #[error("can't halt {0}, since deletion policy is 'DoNotTerminate'")]
    HaltForbidden(String),
    #[error("{kind} {name} is invalid: {errors}")]
    Invalid { kind: &'static str, name: String, errors: FieldErrorList },
    #[error("{kind} {name} can't be deleted, since deletion policy is 'DoNotTerminate'")]
    DeletionForbidden { kind: &'static str, name: String },
    #[error("missing child name: {0}")]
    MissingChildName(String),
    #[error("invalid child name {name}: {reason}")]
    InvalidChildName { name: String, reason: String },
    #[error("failed to list workloads: {0}")]
    Lister(String),
    #[error("unknown kind: {0}")]
    UnknownKind(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_norway::Error),
}

pub type Result<T> = result::Result<T, ApiError>;
