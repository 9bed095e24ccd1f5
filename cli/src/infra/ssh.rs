//! `RemoteTransport` over the system `ssh` and `scp` clients.
//!
//! Every call authenticates with the topology's private key and the host's
//! user and port, runs non-interactively, and is bounded by a timeout.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use deploy_common::Host;

use crate::application::ports::{CommandRunner, RemoteTransport};
use crate::domain::{CommandTimeout, TransportError};

/// Default per-call deadline for remote commands and copies.
pub const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(120);

const SSH_OPTIONS: [&str; 6] = [
    "-o",
    "BatchMode=yes",
    "-o",
    "StrictHostKeyChecking=accept-new",
    "-o",
    "LogLevel=ERROR",
];

/// Infrastructure adapter that routes `ssh`/`scp` through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct SshTransport<R: CommandRunner> {
    runner: R,
    key: PathBuf,
    timeout: Duration,
}

impl<R: CommandRunner> SshTransport<R> {
    pub fn new(runner: R, key: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            key: key.into(),
            timeout,
        }
    }

    fn key(&self) -> String {
        self.key.to_string_lossy().into_owned()
    }

    /// Map the process result onto the host-tagged error taxonomy.
    fn check(&self, host: &Host, action: &str, result: Result<Output>) -> Result<Output> {
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let host = host.to_string();
                let action = action.to_string();
                if err.downcast_ref::<CommandTimeout>().is_some() {
                    return Err(TransportError::Timeout {
                        host,
                        action,
                        secs: self.timeout.as_secs(),
                    }
                    .into());
                }
                return Err(TransportError::Spawn {
                    host,
                    action,
                    reason: format!("{err:#}"),
                }
                .into());
            }
        };
        if output.status.success() {
            return Ok(output);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(match output.status.code() {
            Some(code) => TransportError::NonZeroExit {
                host: host.to_string(),
                action: action.to_string(),
                code,
                stderr,
            },
            None => TransportError::Killed {
                host: host.to_string(),
                action: action.to_string(),
            },
        }
        .into())
    }
}

/// `ssh` arguments for running `command` on `host`.
#[must_use]
pub fn ssh_args(host: &Host, key: &str, command: &str) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        host.ssh_port.to_string(),
        "-i".to_string(),
        key.to_string(),
    ];
    args.extend(SSH_OPTIONS.iter().map(ToString::to_string));
    args.push(format!("{}@{}", host.user, host.address));
    args.push(command.to_string());
    args
}

/// `scp` arguments for copying `local` to `remote` on `host`. Modes are
/// preserved so the executable bit survives the copy.
#[must_use]
pub fn scp_args(host: &Host, key: &str, local: &Path, remote: &str) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        "-P".to_string(),
        host.ssh_port.to_string(),
        "-i".to_string(),
        key.to_string(),
    ];
    args.extend(SSH_OPTIONS.iter().map(ToString::to_string));
    args.push(local.to_string_lossy().into_owned());
    args.push(format!("{}@{}:{remote}", host.user, host.address));
    args
}

impl<R: CommandRunner> RemoteTransport for SshTransport<R> {
    async fn run(&self, host: &Host, command: &str) -> Result<String> {
        tracing::debug!(%host, command, "ssh");
        let args = ssh_args(host, &self.key(), command);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.runner.run_with_timeout("ssh", &args, self.timeout).await;
        let output = self.check(host, &format!("`{command}`"), result)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn copy(&self, host: &Host, local: &Path, remote: &str) -> Result<()> {
        tracing::debug!(%host, local = %local.display(), remote, "scp");
        let args = scp_args(host, &self.key(), local, remote);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.runner.run_with_timeout("scp", &args, self.timeout).await;
        self.check(host, &format!("copy to {remote}"), result)?;
        Ok(())
    }
}
