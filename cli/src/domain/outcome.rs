//! Result of running one phase across a set of hosts.

use crate::domain::error::{Cancelled, PhaseError};

/// Outcome of a per-host phase.
///
/// `completed` lists host identities in the order they finished; hosts listed
/// there keep their remote changes whatever happens afterwards.
#[derive(Debug)]
pub enum PhaseOutcome {
    /// Every host completed.
    Success { completed: Vec<String> },
    /// Some hosts completed, then `failed_host` failed with `cause`.
    PartialFailure {
        completed: Vec<String>,
        failed_host: String,
        cause: anyhow::Error,
    },
    /// The phase could not run at all, or was cancelled.
    Fatal(anyhow::Error),
}

impl PhaseOutcome {
    /// Hosts that completed the phase.
    #[must_use]
    pub fn completed(&self) -> &[String] {
        match self {
            Self::Success { completed } | Self::PartialFailure { completed, .. } => completed,
            Self::Fatal(_) => &[],
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Collapse into the fail-fast contract: completed hosts on success, the
    /// first failure otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] for a partial failure and the inner error for
    /// a fatal one.
    pub fn into_result(self, phase: &str) -> anyhow::Result<Vec<String>> {
        match self {
            Self::Success { completed } => Ok(completed),
            Self::PartialFailure {
                completed,
                failed_host,
                cause,
            } => Err(PhaseError {
                phase: phase.to_string(),
                failed_host,
                completed,
                source: cause,
            }
            .into()),
            Self::Fatal(err) => Err(err),
        }
    }

    /// Outcome used when the operator aborts between hosts.
    #[must_use]
    pub fn cancelled(phase: &str, completed: Vec<String>) -> Self {
        Self::Fatal(
            Cancelled {
                phase: phase.to_string(),
                completed,
            }
            .into(),
        )
    }
}
