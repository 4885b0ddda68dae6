//! Polling import jobs until they reach a terminal state.
//!
//! Each round queries the status of every still unresolved job with one batched
//! call, drops the jobs that now carry a response code, then waits before the
//! next round. The wait grows with the round number (see [`BackoffStrategy`]).
//! Polling stops when no job is left or after [`PollerConfig::max_attempts`]
//! rounds; there is no wait after the last round.

use std::future::Future;
use std::time::Duration;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::error::CallError;
use crate::model::{JobId, JobStatus};

mod backoff;

pub use self::backoff::{BackoffStrategy, LinearBackoff, LinearBuilder};

/// Default number of polling rounds.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Default base delay between two rounds.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Anything able to report the status of a batch of jobs.
pub trait JobStatusSource {
    /// Returns the known statuses of `job_ids`, in any order.
    ///
    /// Statuses for ids that were not requested are ignored by the poller.
    fn fetch_statuses(
        &self,
        job_ids: &[JobId],
    ) -> impl Future<Output = Result<Vec<JobStatus>, CallError>> + Send;
}

/// Polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Maximum number of status rounds, at least one round always runs.
    pub max_attempts: usize,
    /// Delay after the first round.
    pub base_delay: Duration,
    /// Growth of the delay between rounds.
    pub backoff: BackoffStrategy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff: BackoffStrategy::default(),
        }
    }
}

/// Result of a polling session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Terminal statuses, in resolution order.
    pub resolved: Vec<JobStatus>,
    /// Jobs still without response code, in submission order.
    pub unresolved: Vec<JobId>,
    /// Number of status rounds performed.
    pub rounds: usize,
}

/// Polls a [`JobStatusSource`] until every job is resolved or attempts run out.
#[derive(Debug, Clone)]
pub struct CompletionPoller<S> {
    source: S,
    config: PollerConfig,
}

impl<S> CompletionPoller<S>
where
    S: JobStatusSource,
{
    /// Creates a poller.
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Polls until every job in `job_ids` has a response code.
    ///
    /// Duplicate ids are polled once. A failed status call is logged and counts
    /// as a round without progress.
    pub async fn poll_until_resolved(
        &self,
        job_ids: impl IntoIterator<Item = JobId>,
    ) -> PollOutcome {
        let mut unresolved = job_ids.into_iter().collect::<IndexSet<_>>();
        if unresolved.is_empty() {
            return PollOutcome::default();
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut delays = self
            .config
            .backoff
            .delays(self.config.base_delay, max_attempts - 1);
        let mut resolved = Vec::with_capacity(unresolved.len());
        let mut rounds = 0;

        for round in 1..=max_attempts {
            rounds = round;
            let pending = unresolved.iter().copied().collect::<Vec<_>>();
            debug!(round, pending = pending.len(), "polling job statuses");

            match self.source.fetch_statuses(&pending).await {
                Ok(statuses) => {
                    for status in statuses {
                        if status.is_resolved() && unresolved.shift_remove(&status.job_id) {
                            debug!(job_id = %status.job_id, code = ?status.response_code, "job resolved");
                            resolved.push(status);
                        }
                    }
                }
                Err(error) => warn!(round, %error, "status poll failed"),
            }

            if unresolved.is_empty() {
                info!(round, "all jobs resolved");
                break;
            }
            if round == max_attempts {
                break;
            }
            let Some(delay) = delays.next() else {
                break;
            };
            debug!(round, ?delay, remaining = unresolved.len(), "waiting before next round");
            tokio::time::sleep(delay).await;
        }

        if !unresolved.is_empty() {
            warn!(rounds, remaining = unresolved.len(), "polling gave up");
        }

        PollOutcome {
            resolved,
            unresolved: unresolved.into_iter().collect(),
            rounds,
        }
    }
}
