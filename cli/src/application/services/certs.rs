//! Gossip key and TLS material: generation with the product's own tooling and
//! routing of the generated files to the hosts.

use std::path::Path;

use anyhow::{Context, Result};
use deploy_common::{Role, Topology};
use tempfile::TempDir;

use crate::application::ports::{Artifact, CertificateToolInvoker, RemoteTransport};
use crate::application::services::deployment::Deployment;
use crate::domain::certs;
use crate::domain::CertificateToolError;

pub const PHASE_DISTRIBUTE: &str = "distribute certificates";

/// Generated CA and leaf files in a scoped temporary directory.
///
/// Dropping the set removes the directory and everything in it.
#[derive(Debug)]
pub struct CertificateSet {
    dir: TempDir,
    files: Vec<String>,
}

impl CertificateSet {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Generated file names, sorted.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Check one CA and one leaf certificate per host.
    ///
    /// # Errors
    ///
    /// Returns a [`CertificateToolError`] if counts do not match the topology.
    pub fn verify(&self, topology: &Topology, artifact: &Artifact) -> Result<()> {
        certs::verify_generated(&self.files, topology, artifact.product)?;
        Ok(())
    }
}

/// Run the product's keygen and return the trimmed key.
///
/// # Errors
///
/// Returns an error if the tool fails or prints nothing.
pub async fn generate_gossip_key(
    tool: &impl CertificateToolInvoker,
    artifact: &Artifact,
) -> Result<String> {
    let key = tool
        .keygen(&artifact.path, artifact.product)
        .await
        .context("generating gossip key")?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(CertificateToolError::EmptyOutput {
            command: format!("{} keygen", artifact.product.binary()),
        }
        .into());
    }
    Ok(key)
}

/// Create the CA, then one client certificate per client and one server
/// certificate per server, all inside a fresh temporary directory.
///
/// # Errors
///
/// Returns an error if any tool invocation fails; the directory is removed.
pub async fn generate_all(
    tool: &impl CertificateToolInvoker,
    topology: &Topology,
    artifact: &Artifact,
) -> Result<CertificateSet> {
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-cert", artifact.product.binary()))
        .tempdir()
        .context("creating certificate directory")?;
    let product = artifact.product;
    let binary = artifact.path.as_path();

    tool.create_ca(binary, product, dir.path())
        .await
        .context("creating certificate authority")?;
    for role in [Role::Client, Role::Server] {
        for _ in topology.members(role) {
            tool.create_cert(binary, product, dir.path(), role, &topology.dc_name)
                .await
                .with_context(|| format!("creating {role} certificate"))?;
        }
    }

    let files = list_files(dir.path())?;
    tracing::debug!(count = files.len(), dir = %dir.path().display(), "certificates generated");
    Ok(CertificateSet { dir, files })
}

fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

/// Copy the CA certificate and each host's own leaf pair into the host's
/// config directory, servers first.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn distribute(
    transport: &impl RemoteTransport,
    deployment: &Deployment<'_>,
    set: &CertificateSet,
) -> Result<()> {
    let members = deployment.topology.all_hosts();
    let dc_name = deployment.topology.dc_name.as_str();
    let layout = deployment.layout;
    deployment
        .fan_out
        .run(PHASE_DISTRIBUTE, &members, |m| async move {
            let files =
                certs::files_for_host(set.files(), dc_name, m.role, m.host.number, layout.product())?;
            for file in files {
                transport
                    .copy(m.host, &set.path().join(&file), &layout.config_file(&file))
                    .await
                    .with_context(|| format!("copying {file}"))?;
            }
            Ok(())
        })
        .await
        .into_result(PHASE_DISTRIBUTE)
        .map(|_| ())
}
