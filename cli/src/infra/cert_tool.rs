//! `CertificateToolInvoker` that shells out to the product binary.
//!
//! Certificate commands run with the certificate directory as the child's
//! working directory, since the tooling writes its files into the cwd.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use deploy_common::{Product, Role};

use crate::application::ports::{CertificateToolInvoker, CommandRunner};
use crate::domain::{CertificateToolError, RemoteLayout};

/// Production certificate tooling adapter.
pub struct BinaryCertTool<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> BinaryCertTool<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

fn command_line(binary: &Path, args: &[&str]) -> String {
    let name = binary
        .file_name()
        .map_or_else(|| binary.to_string_lossy(), |n| n.to_string_lossy());
    format!("{name} {}", args.join(" "))
}

fn check(binary: &Path, args: &[&str], result: Result<Output>) -> Result<Output> {
    let command = command_line(binary, args);
    let output = result.map_err(|e| CertificateToolError::Spawn {
        command: command.clone(),
        reason: format!("{e:#}"),
    })?;
    if !output.status.success() {
        return Err(CertificateToolError::NonZeroExit {
            command,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(output)
}

impl<R: CommandRunner> CertificateToolInvoker for BinaryCertTool<R> {
    async fn keygen(&self, binary: &Path, product: Product) -> Result<String> {
        let args = RemoteLayout::new(product).keygen_args();
        let program = binary.to_string_lossy();
        let output = check(binary, args, self.runner.run(&program, args).await)?;
        let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if key.is_empty() {
            return Err(CertificateToolError::EmptyOutput {
                command: command_line(binary, args),
            }
            .into());
        }
        Ok(key)
    }

    async fn create_ca(&self, binary: &Path, product: Product, dir: &Path) -> Result<()> {
        let args = RemoteLayout::new(product).ca_create_args();
        let program = binary.to_string_lossy();
        check(binary, args, self.runner.run_in_dir(&program, args, dir).await)?;
        Ok(())
    }

    async fn create_cert(
        &self,
        binary: &Path,
        product: Product,
        dir: &Path,
        role: Role,
        dc_name: &str,
    ) -> Result<()> {
        let args = RemoteLayout::new(product).cert_create_args(role, dc_name);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let program = binary.to_string_lossy();
        check(binary, &args, self.runner.run_in_dir(&program, &args, dir).await)?;
        Ok(())
    }
}
