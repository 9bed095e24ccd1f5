//! Application service — the `up` and `remove` workflows.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All I/O is routed through injected port traits. Phases run strictly in
//! order; the first failing phase aborts the run and nothing is rolled back.

use std::time::Duration;

use anyhow::{Context, Result};
use deploy_common::{Product, Topology, TopologyError};

use crate::application::ports::{
    ArtifactFetcher, CertificateToolInvoker, ProgressReporter, RemoteTransport, TemplateStore,
};
use crate::application::services::binary::{self, BinaryReport};
use crate::application::services::certs;
use crate::application::services::configs::{self, PHASE_CONFIG_DIR, PHASE_DATA_DIR};
use crate::application::services::deployment::Deployment;
use crate::application::services::fan_out::FanOut;
use crate::application::services::lifecycle;
use crate::application::services::render::ConfigRenderer;
use crate::domain::{Cancelled, params, validate_topology};

pub const PHASE_FETCH: &str = "fetch release";
pub const PHASE_GOSSIP: &str = "generate gossip key";
pub const PHASE_CERTS: &str = "generate certificates";
pub const PHASE_ACL: &str = "bootstrap ACL";

/// How often to retry the ACL bootstrap while the cluster elects a leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclRetry {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for AclRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

pub struct UpOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub product: Product,
    pub fan_out: FanOut<'a>,
    pub acl_retry: AclRetry,
}

pub struct RemoveOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub product: Product,
    pub fan_out: FanOut<'a>,
}

/// What an `up` run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpReport {
    pub binary: BinaryReport,
    pub gossip_key_generated: bool,
    /// Certificate files generated, CA included. Zero without TLS.
    pub certificates: usize,
    /// Output of the ACL bootstrap on the first server, when ACL is enabled.
    pub acl_bootstrap: Option<String>,
}

fn ensure_not_cancelled(fan_out: &FanOut<'_>, phase: &str) -> Result<()> {
    if fan_out.is_cancelled() {
        return Err(Cancelled {
            phase: phase.to_string(),
            completed: Vec::new(),
        }
        .into());
    }
    Ok(())
}

/// Provision the whole cluster described by `topology`.
///
/// Re-running is the recovery path: hosts that already list the binary are
/// skipped, while configs, certificates and units are regenerated and
/// overwritten every time.
///
/// # Errors
///
/// Returns the first phase failure (a [`crate::domain::PhaseError`] for
/// per-host phases) or [`Cancelled`] if the token fires.
pub async fn up(
    fetcher: &impl ArtifactFetcher,
    transport: &impl RemoteTransport,
    templates: &impl TemplateStore,
    tool: &impl CertificateToolInvoker,
    topology: &Topology,
    opts: UpOptions<'_, impl ProgressReporter>,
) -> Result<UpReport> {
    let UpOptions {
        reporter,
        product,
        fan_out,
        acl_retry,
    } = opts;
    validate_topology(topology)?;
    tracing::info!(
        %product,
        dc = %topology.dc_name,
        servers = topology.servers.len(),
        clients = topology.clients.len(),
        parallelism = fan_out.parallelism(),
        "deploying"
    );
    let deployment = Deployment::new(topology, product, fan_out);
    let layout = deployment.layout;
    let renderer = ConfigRenderer::new(templates);
    let mut report = UpReport::default();

    ensure_not_cancelled(&fan_out, PHASE_FETCH)?;
    tracing::info!(%product, version = %topology.binary_version, "fetching release");
    reporter.step(&format!("downloading {product} {}...", topology.binary_version));
    // The download is not host-bound, so the token is raced directly.
    let artifact = tokio::select! {
        biased;
        () = fan_out.token().cancelled() => {
            return Err(Cancelled {
                phase: PHASE_FETCH.to_string(),
                completed: Vec::new(),
            }
            .into());
        }
        fetched = fetcher.fetch(product, &topology.binary_version) => fetched
            .with_context(|| format!("{PHASE_FETCH}: {product} {}", topology.binary_version))?,
    };
    reporter.success(&format!("{product} {} downloaded", topology.binary_version));

    ensure_not_cancelled(&fan_out, binary::PHASE)?;
    tracing::info!(phase = binary::PHASE, "phase started");
    reporter.step("deploying binary...");
    report.binary = binary::deploy_binary_all(transport, &deployment, &artifact).await?;
    reporter.success(&format!(
        "binary installed on {} host(s), already present on {}",
        report.binary.installed.len(),
        report.binary.skipped.len()
    ));
    if !report.binary.skipped.is_empty() {
        reporter.warn("existing binaries were kept; their version is not checked");
    }

    ensure_not_cancelled(&fan_out, lifecycle::PHASE_INSTALL_UNITS)?;
    tracing::info!(phase = lifecycle::PHASE_INSTALL_UNITS, "phase started");
    reporter.step("installing service units...");
    lifecycle::install_units(transport, &renderer, &deployment).await?;

    ensure_not_cancelled(&fan_out, PHASE_CONFIG_DIR)?;
    tracing::info!(phase = PHASE_CONFIG_DIR, "phase started");
    configs::create_dir_all(transport, &deployment, PHASE_CONFIG_DIR, &layout.config_dir()).await?;

    let gossip_key = if topology.gossip_enabled {
        ensure_not_cancelled(&fan_out, PHASE_GOSSIP)?;
        tracing::info!(phase = PHASE_GOSSIP, "phase started");
        reporter.step("generating gossip key...");
        let key = certs::generate_gossip_key(tool, &artifact).await?;
        report.gossip_key_generated = true;
        Some(key)
    } else {
        None
    };

    ensure_not_cancelled(&fan_out, configs::PHASE_CONFIGS)?;
    tracing::info!(phase = configs::PHASE_CONFIGS, "phase started");
    reporter.step("copying configuration...");
    let base = params::base_params(
        topology,
        product,
        gossip_key.as_deref(),
        &layout.config_dir(),
        &layout.data_dir(),
    );
    configs::distribute_configs(transport, &renderer, &deployment, &base).await?;
    reporter.success("configuration copied");

    if topology.tls_enabled {
        ensure_not_cancelled(&fan_out, PHASE_CERTS)?;
        tracing::info!(phase = PHASE_CERTS, "phase started");
        reporter.step("generating certificates...");
        let set = certs::generate_all(tool, topology, &artifact)
            .await
            .context(PHASE_CERTS)?;
        set.verify(topology, &artifact).context(PHASE_CERTS)?;
        report.certificates = set.files().len();

        ensure_not_cancelled(&fan_out, certs::PHASE_DISTRIBUTE)?;
        tracing::info!(phase = certs::PHASE_DISTRIBUTE, "phase started");
        certs::distribute(transport, &deployment, &set).await?;
        reporter.success("certificates distributed");
    }

    ensure_not_cancelled(&fan_out, PHASE_DATA_DIR)?;
    tracing::info!(phase = PHASE_DATA_DIR, "phase started");
    configs::create_dir_all(transport, &deployment, PHASE_DATA_DIR, &layout.data_dir()).await?;

    ensure_not_cancelled(&fan_out, lifecycle::PHASE_START_SERVERS)?;
    tracing::info!(phase = "start services", "phase started");
    reporter.step("starting services...");
    lifecycle::start_all(transport, &deployment).await?;
    reporter.success("services started");

    if topology.acl_enabled {
        ensure_not_cancelled(&fan_out, PHASE_ACL)?;
        tracing::info!(phase = PHASE_ACL, "phase started");
        reporter.step("bootstrapping ACL...");
        report.acl_bootstrap = Some(bootstrap_acl(transport, &deployment, acl_retry).await?);
    }

    Ok(report)
}

/// Run the ACL bootstrap on the first server and return its output.
///
/// Retried while the cluster may still be electing a leader; a timeout is not
/// retried.
///
/// # Errors
///
/// Returns the last failure once the attempts are used up.
pub async fn bootstrap_acl(
    transport: &impl RemoteTransport,
    deployment: &Deployment<'_>,
    retry: AclRetry,
) -> Result<String> {
    let server = deployment
        .topology
        .first_server()
        .ok_or(TopologyError::NoServers)?;
    let command = deployment.layout.acl_bootstrap(deployment.topology.tls_enabled);
    let attempts = retry.attempts.max(1);
    let mut attempt = 1;
    loop {
        match transport.run(server.host, &command).await {
            Ok(output) => return Ok(output.trim().to_string()),
            Err(err) if attempt < attempts && !is_timeout(&err) => {
                tracing::warn!(attempt, error = %err, "ACL bootstrap failed, retrying");
                tokio::select! {
                    () = deployment.fan_out.token().cancelled() => {
                        return Err(Cancelled {
                            phase: PHASE_ACL.to_string(),
                            completed: Vec::new(),
                        }
                        .into());
                    }
                    () = tokio::time::sleep(retry.delay) => {}
                }
                attempt += 1;
            }
            Err(err) => {
                return Err(err.context(format!("{PHASE_ACL} on {}", server.host)));
            }
        }
    }
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<crate::domain::TransportError>()
        .is_some_and(crate::domain::TransportError::is_timeout)
}

/// Tear the cluster down: services, then config directories, then data
/// directories. Each step covers every host before the next one starts.
///
/// # Errors
///
/// Returns the first failing step's [`crate::domain::PhaseError`].
pub async fn remove(
    transport: &impl RemoteTransport,
    topology: &Topology,
    opts: RemoveOptions<'_, impl ProgressReporter>,
) -> Result<()> {
    let RemoveOptions {
        reporter,
        product,
        fan_out,
    } = opts;
    validate_topology(topology)?;
    let deployment = Deployment::new(topology, product, fan_out);
    let layout = deployment.layout;

    ensure_not_cancelled(&fan_out, lifecycle::PHASE_STOP)?;
    tracing::info!(phase = lifecycle::PHASE_STOP, "phase started");
    reporter.step("stopping services...");
    lifecycle::stop_all(transport, &deployment).await?;
    reporter.success("services removed");

    ensure_not_cancelled(&fan_out, configs::PHASE_DELETE_CONFIGS)?;
    tracing::info!(phase = configs::PHASE_DELETE_CONFIGS, "phase started");
    reporter.step("deleting configuration...");
    configs::remove_dir_all(
        transport,
        &deployment,
        configs::PHASE_DELETE_CONFIGS,
        &layout.config_dir(),
    )
    .await?;

    ensure_not_cancelled(&fan_out, configs::PHASE_DELETE_DATA)?;
    tracing::info!(phase = configs::PHASE_DELETE_DATA, "phase started");
    reporter.step("deleting data...");
    configs::remove_dir_all(
        transport,
        &deployment,
        configs::PHASE_DELETE_DATA,
        &layout.data_dir(),
    )
    .await?;
    reporter.success("cluster removed");
    Ok(())
}
