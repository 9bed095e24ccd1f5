//! Per-host execution of one phase.
//!
//! Hosts run in list order. With a parallelism above one, up to that many
//! hosts are in flight at once, but results are still consumed in list order
//! so the first failure reported is the first failing host in iteration order.

use std::future::Future;

use anyhow::Result;
use deploy_common::Member;
use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::domain::PhaseOutcome;

/// Bounded fan-out over the hosts of a phase, honouring cancellation.
#[derive(Debug, Clone, Copy)]
pub struct FanOut<'a> {
    parallelism: usize,
    cancel: &'a CancellationToken,
}

impl<'a> FanOut<'a> {
    /// A parallelism of 0 is treated as 1.
    #[must_use]
    pub fn new(parallelism: usize, cancel: &'a CancellationToken) -> Self {
        Self {
            parallelism: parallelism.max(1),
            cancel,
        }
    }

    /// Strictly sequential fan-out.
    #[must_use]
    pub fn sequential(cancel: &'a CancellationToken) -> Self {
        Self::new(1, cancel)
    }

    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn token(&self) -> &'a CancellationToken {
        self.cancel
    }

    /// Run `op` for every member; see [`FanOut::collect`].
    pub async fn run<'m, F, Fut>(&self, phase: &str, members: &[Member<'m>], op: F) -> PhaseOutcome
    where
        F: Fn(Member<'m>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.collect(phase, members, op).await.0
    }

    /// Run `op` for every member and keep each host's value.
    ///
    /// Stops at the first failure (hosts not yet started are never started)
    /// or at cancellation (in-flight work is dropped). Values are returned in
    /// the same order as the completed host list of the outcome.
    pub async fn collect<'m, T, F, Fut>(
        &self,
        phase: &str,
        members: &[Member<'m>],
        op: F,
    ) -> (PhaseOutcome, Vec<T>)
    where
        F: Fn(Member<'m>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut completed = Vec::with_capacity(members.len());
        let mut values = Vec::with_capacity(members.len());
        let op = &op;
        let mut results = stream::iter(members.iter().copied())
            .map(|member| async move { (member, op(member).await) })
            .buffered(self.parallelism);

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::warn!(phase, completed = completed.len(), "phase cancelled");
                    return (PhaseOutcome::cancelled(phase, completed), values);
                }
                next = results.next() => next,
            };
            let Some((member, result)) = next else {
                break;
            };
            let host = member.host.to_string();
            match result {
                Ok(value) => {
                    tracing::debug!(phase, %host, "host done");
                    completed.push(host);
                    values.push(value);
                }
                Err(cause) => {
                    tracing::warn!(phase, %host, error = %cause, "host failed");
                    return (
                        PhaseOutcome::PartialFailure {
                            completed,
                            failed_host: host,
                            cause,
                        },
                        values,
                    );
                }
            }
        }
        (PhaseOutcome::Success { completed }, values)
    }
}
