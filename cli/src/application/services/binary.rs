//! Agent binary distribution.

use std::path::Path;

use anyhow::{Context, Result};
use deploy_common::Host;

use crate::application::ports::{Artifact, RemoteTransport};
use crate::application::services::deployment::Deployment;
use crate::domain::RemoteLayout;
use crate::domain::layout::listing_contains;

pub const PHASE: &str = "deploy binary";

/// Hosts that received the binary and hosts that already had it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BinaryReport {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Copy the executable to one host unless the binary directory already lists
/// it. Returns `true` when a copy happened.
///
/// Presence is the only check: an older version already on the host is left
/// in place.
///
/// # Errors
///
/// Returns an error if the listing or the copy fails.
pub async fn deploy_binary(
    transport: &impl RemoteTransport,
    host: &Host,
    layout: RemoteLayout,
    local: &Path,
) -> Result<bool> {
    let listing = transport
        .run(host, &layout.list_bin_dir())
        .await
        .context("listing remote binaries")?;
    if listing_contains(&listing, layout.product().binary()) {
        tracing::debug!(%host, "binary already present, skipping copy");
        return Ok(false);
    }
    transport
        .copy(host, local, &layout.binary_path())
        .await
        .context("copying binary")?;
    Ok(true)
}

/// Deploy the binary to every host, servers first.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn deploy_binary_all(
    transport: &impl RemoteTransport,
    deployment: &Deployment<'_>,
    artifact: &Artifact,
) -> Result<BinaryReport> {
    let members = deployment.topology.all_hosts();
    let layout = deployment.layout;
    let (outcome, copied) = deployment
        .fan_out
        .collect(PHASE, &members, |m| {
            deploy_binary(transport, m.host, layout, &artifact.path)
        })
        .await;
    let completed = outcome.into_result(PHASE)?;

    let mut report = BinaryReport::default();
    for (host, copied) in completed.into_iter().zip(copied) {
        if copied {
            report.installed.push(host);
        } else {
            report.skipped.push(host);
        }
    }
    Ok(report)
}
