//! Validation of a loaded topology before any remote work starts.
//!
//! Pure functions only.

use std::sync::LazyLock;

use deploy_common::{Role, Topology};
use regex::Regex;

use crate::domain::error::ConfigValidationError;

#[allow(clippy::unwrap_used)] // Pattern is a compile-time constant
static DC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

/// Validates the datacenter name.
///
/// # Errors
///
/// Returns [`ConfigValidationError::DatacenterName`] if the name is invalid.
pub fn validate_dc_name(name: &str) -> Result<(), ConfigValidationError> {
    if !DC_NAME_RE.is_match(name) {
        return Err(ConfigValidationError::DatacenterName(name.to_string()));
    }
    Ok(())
}

/// Validates the release version string.
///
/// # Errors
///
/// Returns [`ConfigValidationError::Version`] if it is not a semantic version.
pub fn validate_version(version: &str) -> Result<(), ConfigValidationError> {
    semver::Version::parse(version)
        .map(|_| ())
        .map_err(|e| ConfigValidationError::Version {
            version: version.to_string(),
            reason: e.to_string(),
        })
}

/// Full topology validation: structural invariants plus naming rules.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_topology(topology: &Topology) -> Result<(), ConfigValidationError> {
    topology.validate()?;
    validate_dc_name(&topology.dc_name)?;
    validate_version(&topology.binary_version)?;
    if topology.ssh_key.trim().is_empty() {
        return Err(ConfigValidationError::MissingSshKey);
    }
    if topology.tls_enabled {
        validate_contiguous_numbers(topology)?;
    }
    Ok(())
}

/// The certificate tool numbers leaf pairs `0..n` per role, so host numbers
/// must match that sequence for every host to find its own pair.
fn validate_contiguous_numbers(topology: &Topology) -> Result<(), ConfigValidationError> {
    for role in [Role::Server, Role::Client] {
        let mut numbers: Vec<u32> = topology.members(role).iter().map(|m| m.host.number).collect();
        numbers.sort_unstable();
        let contiguous = numbers
            .iter()
            .zip(0u32..)
            .all(|(number, expected)| *number == expected);
        if !contiguous {
            return Err(ConfigValidationError::NonContiguousNumbers {
                role: role.to_string(),
                last: numbers.len() - 1,
            });
        }
    }
    Ok(())
}
