// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub const APP_NAME: &str = "kubedb-defaulter";
pub const ENV_PREFIX: &str = "KUBEDB";
pub const DEFAULT_CATALOG_FILE: &str = "/etc/kubedb/catalog.yaml";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const DEFAULT_LOG_LEVEL: &str = "info";
