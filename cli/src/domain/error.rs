//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator; callers recover them with `downcast_ref`.

use thiserror::Error;

// ── Artifact errors ───────────────────────────────────────────────────────────

/// Failure to obtain the release archive.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to download {url}: {reason}")]
    Request { url: String, reason: String },

    #[error("failed to write downloaded archive: {0}")]
    Io(String),

    #[error("no checksum for {file} in {url}")]
    ChecksumMissing { url: String, file: String },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Failure to pull the executable out of the release archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open release archive {archive}: {reason}")]
    Archive { archive: String, reason: String },

    #[error("release archive {archive} has no entry named '{entry}'")]
    EntryMissing { archive: String, entry: String },

    #[error("cannot make {path} executable: {reason}")]
    Permissions { path: String, reason: String },
}

// ── Transport errors ──────────────────────────────────────────────────────────

/// Remote command or copy failure, always tagged with the host.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("[{host}] {action} failed with exit code {code}: {stderr}")]
    NonZeroExit {
        host: String,
        action: String,
        code: i32,
        stderr: String,
    },

    #[error("[{host}] {action} was terminated by a signal")]
    Killed { host: String, action: String },

    #[error("[{host}] {action} could not be started: {reason}")]
    Spawn {
        host: String,
        action: String,
        reason: String,
    },

    #[error("[{host}] {action} timed out after {secs}s")]
    Timeout {
        host: String,
        action: String,
        secs: u64,
    },
}

impl TransportError {
    /// Host identity the error refers to.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::NonZeroExit { host, .. }
            | Self::Killed { host, .. }
            | Self::Spawn { host, .. }
            | Self::Timeout { host, .. } => host,
        }
    }

    /// Returns `true` for the timeout variant.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Raised by the command runner when a child process exceeds its deadline.
#[derive(Debug, Error)]
#[error("{program} timed out after {secs}s")]
pub struct CommandTimeout {
    pub program: String,
    pub secs: u64,
}

// ── Rendering errors ──────────────────────────────────────────────────────────

/// Missing or malformed configuration template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("template '{name}' is malformed: {reason}")]
    Parse { name: String, reason: String },

    #[error("template '{name}' failed to render: {reason}")]
    Render { name: String, reason: String },
}

// ── Certificate tooling errors ────────────────────────────────────────────────

/// The product's own key/certificate tooling failed.
#[derive(Debug, Error)]
pub enum CertificateToolError {
    #[error("`{command}` exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` could not be run: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },

    #[error("expected {expected} {role} certificates, found {found}")]
    CountMismatch {
        role: String,
        expected: usize,
        found: usize,
    },

    #[error("certificate authority file {0} was not generated")]
    MissingCa(String),

    #[error("leaf certificate file {0} was not generated")]
    MissingLeaf(String),
}

// ── Topology errors ───────────────────────────────────────────────────────────

/// The topology violates an invariant the deployment relies on.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error(transparent)]
    Structure(#[from] deploy_common::TopologyError),

    #[error("invalid datacenter name '{0}': must match ^[a-z0-9][a-z0-9_-]*$")]
    DatacenterName(String),

    #[error("invalid release version '{version}': {reason}")]
    Version { version: String, reason: String },

    #[error("no SSH private key configured")]
    MissingSshKey,

    #[error("{role} numbers must run from 0 to {last} without gaps when TLS is enabled")]
    NonContiguousNumbers { role: String, last: usize },
}

// ── Orchestration errors ──────────────────────────────────────────────────────

/// A phase stopped on a host; hosts listed in `completed` keep their changes.
#[derive(Debug, Error)]
#[error("{phase}: failed on {failed_host} ({} host(s) completed before it): {source:#}", .completed.len())]
pub struct PhaseError {
    pub phase: String,
    pub failed_host: String,
    pub completed: Vec<String>,
    pub source: anyhow::Error,
}

/// The operator aborted the run.
#[derive(Debug, Error)]
#[error("cancelled during {phase} ({} host(s) completed in this phase)", .completed.len())]
pub struct Cancelled {
    pub phase: String,
    pub completed: Vec<String>,
}
