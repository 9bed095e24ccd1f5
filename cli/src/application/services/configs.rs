//! Remote directories and per-host agent configuration.

use std::io::Write as _;

use anyhow::{Context, Result};
use deploy_common::{Host, Member};

use crate::application::ports::{RemoteTransport, TemplateStore};
use crate::application::services::deployment::Deployment;
use crate::application::services::render::{ConfigRenderer, RenderedConfig};
use crate::domain::params::{self, Params};
use crate::domain::RemoteLayout;

pub const PHASE_CONFIG_DIR: &str = "create config directory";
pub const PHASE_CONFIGS: &str = "copy configs";
pub const PHASE_DATA_DIR: &str = "create data directory";
pub const PHASE_DELETE_CONFIGS: &str = "delete configs";
pub const PHASE_DELETE_DATA: &str = "delete data";

/// Write rendered bytes to a scoped local temp file and copy it to the host.
/// The temp file is removed when this returns, on every path.
///
/// # Errors
///
/// Returns an error if the temp file cannot be written or the copy fails.
pub async fn copy_rendered(
    transport: &impl RemoteTransport,
    host: &Host,
    rendered: &RenderedConfig,
) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new().context("creating temp file")?;
    file.write_all(&rendered.bytes)
        .and_then(|()| file.flush())
        .with_context(|| format!("writing rendered {}", rendered.template))?;
    transport
        .copy(host, file.path(), &rendered.remote_path)
        .await
        .with_context(|| format!("copying {} to {}", rendered.template, rendered.remote_path))
}

/// `mkdir -p <dir>` on every host, servers first.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn create_dir_all(
    transport: &impl RemoteTransport,
    deployment: &Deployment<'_>,
    phase: &str,
    dir: &str,
) -> Result<()> {
    let members = deployment.topology.all_hosts();
    let command = RemoteLayout::mkdir(dir);
    let command = command.as_str();
    deployment
        .fan_out
        .run(phase, &members, |m| async move {
            transport.run(m.host, command).await.map(|_| ())
        })
        .await
        .into_result(phase)
        .map(|_| ())
}

/// `rm -rf <dir>` on every host, clients first.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn remove_dir_all(
    transport: &impl RemoteTransport,
    deployment: &Deployment<'_>,
    phase: &str,
    dir: &str,
) -> Result<()> {
    let members = deployment.topology.teardown_hosts();
    let command = RemoteLayout::remove_dir(dir);
    let command = command.as_str();
    deployment
        .fan_out
        .run(phase, &members, |m| async move {
            transport.run(m.host, command).await.map(|_| ())
        })
        .await
        .into_result(phase)
        .map(|_| ())
}

/// Render the base and role configuration for one host.
///
/// # Errors
///
/// Returns a [`crate::domain::TemplateError`] on any rendering failure.
pub fn render_host_configs(
    renderer: &ConfigRenderer<'_, impl TemplateStore>,
    deployment: &Deployment<'_>,
    base: &Params,
    member: Member<'_>,
) -> Result<[RenderedConfig; 2]> {
    let topology = deployment.topology;
    let layout = deployment.layout;
    let host_params = params::host_params(base, topology, member, deployment.product());
    let role_params = params::role_params(&host_params, topology, member.role);

    let base_name = layout.base_template();
    let role_name = layout.role_template(member.role);
    let base_remote = layout.config_file(&base_name);
    let role_remote = layout.config_file(&role_name);
    Ok([
        renderer.render_to(&base_name, host_params, base_remote)?,
        renderer.render_to(&role_name, role_params, role_remote)?,
    ])
}

/// Render and copy the base and role configuration to every host, servers
/// first. Existing files are overwritten.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn distribute_configs(
    transport: &impl RemoteTransport,
    renderer: &ConfigRenderer<'_, impl TemplateStore>,
    deployment: &Deployment<'_>,
    base: &Params,
) -> Result<()> {
    let members = deployment.topology.all_hosts();
    deployment
        .fan_out
        .run(PHASE_CONFIGS, &members, |m| async move {
            for rendered in render_host_configs(renderer, deployment, base, m)? {
                copy_rendered(transport, m.host, &rendered).await?;
            }
            Ok(())
        })
        .await
        .into_result(PHASE_CONFIGS)
        .map(|_| ())
}
