//! Deterministic certificate file names and routing of generated files.
//!
//! The product tooling names leaf certificates
//! `<dc>-<role>-<binary>-<number>.pem` and their keys `...-key.pem`; the CA
//! is `<binary>-agent-ca.pem`. Routing matches the whole
//! `<dc>-<role>-<binary>-` prefix, so the datacenter name may itself contain
//! a role word.

use deploy_common::{Product, Role, Topology};

use crate::domain::error::CertificateToolError;

/// CA certificate file name, e.g. `consul-agent-ca.pem`.
#[must_use]
pub fn ca_file(product: Product) -> String {
    format!("{}-agent-ca.pem", product.binary())
}

/// CA private key file name. Never leaves the operator's machine.
#[must_use]
pub fn ca_key_file(product: Product) -> String {
    format!("{}-agent-ca-key.pem", product.binary())
}

/// Leaf certificate file name, e.g. `dc1-server-consul-0.pem`.
#[must_use]
pub fn cert_file(dc_name: &str, role: Role, product: Product, number: u32) -> String {
    format!("{dc_name}-{role}-{}-{number}.pem", product.binary())
}

/// Leaf private key file name, e.g. `dc1-server-consul-0-key.pem`.
#[must_use]
pub fn key_file(dc_name: &str, role: Role, product: Product, number: u32) -> String {
    format!("{dc_name}-{role}-{}-{number}-key.pem", product.binary())
}

fn role_prefix(dc_name: &str, role: Role, product: Product) -> String {
    format!("{dc_name}-{role}-{}-", product.binary())
}

/// Whether `file_name` is a leaf certificate or key generated for `role`.
#[must_use]
pub fn belongs_to_role(file_name: &str, dc_name: &str, role: Role, product: Product) -> bool {
    file_name.starts_with(&role_prefix(dc_name, role, product)) && file_name.ends_with(".pem")
}

/// Files one host must receive: the CA certificate followed by its own leaf
/// certificate and key.
///
/// # Errors
///
/// Returns [`CertificateToolError::MissingLeaf`] if the host's pair was not
/// generated.
pub fn files_for_host(
    generated: &[String],
    dc_name: &str,
    role: Role,
    number: u32,
    product: Product,
) -> Result<Vec<String>, CertificateToolError> {
    let mut files = vec![ca_file(product)];
    for name in [
        cert_file(dc_name, role, product, number),
        key_file(dc_name, role, product, number),
    ] {
        if !generated.contains(&name) {
            return Err(CertificateToolError::MissingLeaf(name));
        }
        files.push(name);
    }
    Ok(files)
}

/// Number of leaf certificates (keys excluded) generated for `role`.
#[must_use]
pub fn count_certificates(
    generated: &[String],
    dc_name: &str,
    role: Role,
    product: Product,
) -> usize {
    generated
        .iter()
        .filter(|name| belongs_to_role(name, dc_name, role, product))
        .filter(|name| !name.ends_with("-key.pem"))
        .count()
}

/// Check that exactly one CA and one certificate per host were generated.
///
/// # Errors
///
/// Returns [`CertificateToolError::MissingCa`] or
/// [`CertificateToolError::CountMismatch`] on the first violation.
pub fn verify_generated(
    generated: &[String],
    topology: &Topology,
    product: Product,
) -> Result<(), CertificateToolError> {
    let ca = ca_file(product);
    if !generated.iter().any(|name| *name == ca) {
        return Err(CertificateToolError::MissingCa(ca));
    }
    for (role, expected) in [
        (Role::Server, topology.servers.len()),
        (Role::Client, topology.clients.len()),
    ] {
        let found = count_certificates(generated, &topology.dc_name, role, product);
        if found != expected {
            return Err(CertificateToolError::CountMismatch {
                role: role.to_string(),
                expected,
                found,
            });
        }
    }
    Ok(())
}
