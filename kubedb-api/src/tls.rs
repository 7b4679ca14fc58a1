// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::ResourceExt;

use crate::crd::{Database, common::CertificateSpec};
use crate::meta::name_with_suffix;

/// Default certificate (and secret) name for an alias of the named resource.
pub fn certificate_name(name: &str, alias: &str) -> String {
    name_with_suffix(name, &format!("{}-cert", alias))
}

pub fn get_certificate<'a>(certificates: &'a [CertificateSpec], alias: &str) -> Option<&'a CertificateSpec> {
    certificates.iter().find(|cert| cert.alias == alias)
}

/// The secret name the user set for an alias, if any.
pub fn get_certificate_secret_name<'a>(certificates: &'a [CertificateSpec], alias: &str) -> Option<&'a str> {
    get_certificate(certificates, alias)
        .and_then(|cert| cert.secret_name.as_deref())
        .filter(|name| !name.is_empty())
}

/// Give `alias` a secret name unless it already has one, adding the
/// certificate entry when it is missing.
pub fn set_missing_secret_name_for_certificate(
    certificates: &mut Vec<CertificateSpec>,
    alias: &str,
    secret_name: &str,
) {
    match certificates.iter_mut().find(|cert| cert.alias == alias) {
        Some(cert) => {
            if cert.secret_name.as_deref().map_or(true, str::is_empty) {
                cert.secret_name = Some(secret_name.to_string());
            }
        },
        None => certificates.push(CertificateSpec {
            alias: alias.to_string(),
            secret_name: Some(secret_name.to_string()),
            ..Default::default()
        }),
    }
}

/// Fill every unset field of the `spec.alias` entry from `spec`, adding the
/// entry when it is missing.
pub fn set_missing_spec_for_certificate(certificates: &mut Vec<CertificateSpec>, spec: CertificateSpec) {
    let Some(cert) = certificates.iter_mut().find(|cert| cert.alias == spec.alias) else {
        certificates.push(spec);
        return;
    };

    if cert.issuer_ref.is_none() {
        cert.issuer_ref = spec.issuer_ref;
    }
    if cert.secret_name.as_deref().map_or(true, str::is_empty) && spec.secret_name.is_some() {
        cert.secret_name = spec.secret_name;
    }
    if cert.subject.is_none() {
        cert.subject = spec.subject;
    }
    if cert.dns_names.is_empty() {
        cert.dns_names = spec.dns_names;
    }
    if cert.ip_addresses.is_empty() {
        cert.ip_addresses = spec.ip_addresses;
    }
    if cert.duration.is_none() {
        cert.duration = spec.duration;
    }
    if cert.renew_before.is_none() {
        cert.renew_before = spec.renew_before;
    }
    if cert.private_key.is_none() {
        cert.private_key = spec.private_key;
    }
}

/// Overwrite the secret name of an existing entry.
pub fn set_secret_name_for_certificate(certificates: &mut [CertificateSpec], alias: &str, secret_name: Option<String>) {
    if let Some(cert) = certificates.iter_mut().find(|cert| cert.alias == alias) {
        cert.secret_name = secret_name;
    }
}

pub fn remove_certificate(certificates: &mut Vec<CertificateSpec>, alias: &str) {
    certificates.retain(|cert| cert.alias != alias);
}

/// With an issuer configured, make sure every certificate alias of the kind
/// has a secret name.
pub fn set_default_certificates<D: Database>(db: &mut D) {
    let name = db.name_any();
    let aliases = db.descriptor().certificate_aliases;

    let Some(tls) = db.common_mut().tls.as_mut() else { return };
    if tls.issuer_ref.is_none() {
        return;
    }

    for alias in aliases {
        set_missing_secret_name_for_certificate(&mut tls.certificates, alias, &certificate_name(&name, alias));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::common::X509Subject;

    fn cert(alias: &str, secret: Option<&str>) -> CertificateSpec {
        CertificateSpec {
            alias: alias.to_string(),
            secret_name: secret.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_secret_name_is_added() {
        let mut certs = vec![cert("server", None)];

        set_missing_secret_name_for_certificate(&mut certs, "server", "db-server-cert");
        set_missing_secret_name_for_certificate(&mut certs, "client", "db-client-cert");

        assert_eq!(get_certificate_secret_name(&certs, "server"), Some("db-server-cert"));
        assert_eq!(get_certificate_secret_name(&certs, "client"), Some("db-client-cert"));
    }

    #[test]
    fn test_explicit_secret_name_is_kept() {
        let mut certs = vec![cert("server", Some("mine"))];

        set_missing_secret_name_for_certificate(&mut certs, "server", "db-server-cert");

        assert_eq!(get_certificate_secret_name(&certs, "server"), Some("mine"));
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn test_missing_spec_fills_only_gaps() {
        let mut certs = vec![CertificateSpec {
            alias: "server".to_string(),
            dns_names: vec!["db.example.com".to_string()],
            ..Default::default()
        }];

        set_missing_spec_for_certificate(&mut certs, CertificateSpec {
            alias: "server".to_string(),
            secret_name: Some("db-server-cert".to_string()),
            subject: Some(X509Subject { organizations: vec!["kubedb".to_string()], ..Default::default() }),
            dns_names: vec!["ignored".to_string()],
            ..Default::default()
        });

        assert_eq!(certs[0].secret_name.as_deref(), Some("db-server-cert"));
        assert_eq!(certs[0].dns_names, vec!["db.example.com".to_string()]);
        assert_eq!(certs[0].subject.as_ref().unwrap().organizations, vec!["kubedb".to_string()]);
    }

    #[test]
    fn test_remove_certificate() {
        let mut certs = vec![cert("archiver", None), cert("http", None)];

        remove_certificate(&mut certs, "archiver");

        assert!(get_certificate(&certs, "archiver").is_none());
        assert!(get_certificate(&certs, "http").is_some());
    }
}
