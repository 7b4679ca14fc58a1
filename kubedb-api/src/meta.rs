// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::collections::BTreeMap;

use crate::constants::GROUP_NAME;

pub fn name_with_suffix(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return name.to_string();
    }
    format!("{}-{}", name, suffix)
}

pub fn name_with_prefix(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        return name.to_string();
    }
    format!("{}-{}", prefix, name)
}

/// Merge `extra` maps over `base`, later maps winning on key collisions.
pub fn overwrite_keys(
    mut base: BTreeMap<String, String>,
    extra: &[&BTreeMap<String, String>],
) -> BTreeMap<String, String> {
    for map in extra {
        for (key, value) in map.iter() {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

/// Whether a user supplied label key sits in a namespace KubeDB reserves.
pub fn is_reserved_key(key: &str) -> bool {
    let (prefix, _) = key.split_once('/').unwrap_or(("", key));
    prefix == GROUP_NAME || prefix.ends_with(&format!(".{}", GROUP_NAME))
}

/// Drop reserved keys from a user supplied map.
pub fn filter_keys(user: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    user.iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Layer user labels under computed ones: reserved user keys are dropped and
/// computed keys always win.
pub fn merge_user_labels(
    computed: BTreeMap<String, String>,
    user: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let filtered = filter_keys(user);
    overwrite_keys(filtered, &[&computed])
}

/// Split a trailing decimal number off a name, e.g. `db-shard12` → 12.
pub fn trailing_number(name: &str) -> Option<(&str, u32)> {
    let digits = name.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let (head, tail) = name.split_at(name.len() - digits);
    tail.parse().ok().map(|n| (head, n))
}
