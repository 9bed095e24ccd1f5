//! Service unit installation and systemd transitions.

use anyhow::{Context, Result};
use deploy_common::Role;

use crate::application::ports::{RemoteTransport, TemplateStore};
use crate::application::services::configs::copy_rendered;
use crate::application::services::deployment::Deployment;
use crate::application::services::render::ConfigRenderer;
use crate::domain::params;

pub const PHASE_INSTALL_UNITS: &str = "install service units";
pub const PHASE_START_SERVERS: &str = "start servers";
pub const PHASE_START_CLIENTS: &str = "start clients";
pub const PHASE_STOP: &str = "stop services";

/// Render the unit for every host (agent name substituted) and copy it to
/// the systemd unit directory, servers first.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn install_units(
    transport: &impl RemoteTransport,
    renderer: &ConfigRenderer<'_, impl TemplateStore>,
    deployment: &Deployment<'_>,
) -> Result<()> {
    let members = deployment.topology.all_hosts();
    let layout = deployment.layout;
    let binary_path = layout.binary_path();
    let config_dir = layout.config_dir();
    let (binary_path, config_dir) = (binary_path.as_str(), config_dir.as_str());
    deployment
        .fan_out
        .run(PHASE_INSTALL_UNITS, &members, |m| async move {
            let unit = renderer.render_to(
                &layout.unit_template(),
                params::unit_params(m, binary_path, config_dir),
                layout.unit_path(),
            )?;
            copy_rendered(transport, m.host, &unit).await
        })
        .await
        .into_result(PHASE_INSTALL_UNITS)
        .map(|_| ())
}

/// `systemctl enable` then `systemctl start` on every server, and only once
/// all servers are up, the same on every client.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host;
/// clients are not touched if a server fails.
pub async fn start_all(transport: &impl RemoteTransport, deployment: &Deployment<'_>) -> Result<()> {
    let layout = deployment.layout;
    let enable = layout.enable();
    let start = layout.start();
    let (enable, start) = (enable.as_str(), start.as_str());

    for (role, phase) in [
        (Role::Server, PHASE_START_SERVERS),
        (Role::Client, PHASE_START_CLIENTS),
    ] {
        let members = deployment.topology.members(role);
        if members.is_empty() {
            continue;
        }
        deployment
            .fan_out
            .run(phase, &members, |m| async move {
                transport
                    .run(m.host, enable)
                    .await
                    .context("enabling service")?;
                transport
                    .run(m.host, start)
                    .await
                    .context("starting service")?;
                Ok(())
            })
            .await
            .into_result(phase)?;
    }
    Ok(())
}

/// Stop, disable and delete the unit on every host, clients first so servers
/// stop last.
///
/// # Errors
///
/// Returns a [`crate::domain::PhaseError`] naming the first failing host.
pub async fn stop_all(transport: &impl RemoteTransport, deployment: &Deployment<'_>) -> Result<()> {
    let members = deployment.topology.teardown_hosts();
    let command = deployment.layout.stop_disable_remove();
    let command = command.as_str();
    deployment
        .fan_out
        .run(PHASE_STOP, &members, |m| async move {
            transport.run(m.host, command).await.map(|_| ())
        })
        .await
        .into_result(PHASE_STOP)
        .map(|_| ())
}
