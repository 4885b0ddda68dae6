//! End of run summary.

use std::fmt;

use crate::model::{FailureRecord, JobId, JobStatus};
use crate::poller::PollOutcome;

/// Outcome of a migration run that reached the polling stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Routes that could not be exported.
    pub export_failures: Vec<FailureRecord>,
    /// Routes that could not be imported.
    pub import_failures: Vec<FailureRecord>,
    /// Jobs resolved with the success code.
    pub succeeded: Vec<JobStatus>,
    /// Jobs resolved with any other code.
    pub rejected: Vec<JobStatus>,
    /// Jobs still running when polling gave up.
    pub unresolved: Vec<JobId>,
    /// Number of polling rounds performed.
    pub rounds: usize,
}

impl MigrationReport {
    /// Builds a report, splitting resolved jobs on `success_code`.
    pub fn new(
        export_failures: Vec<FailureRecord>,
        import_failures: Vec<FailureRecord>,
        outcome: PollOutcome,
        success_code: i64,
    ) -> Self {
        let (succeeded, rejected) = outcome
            .resolved
            .into_iter()
            .partition(|status| status.response_code == Some(success_code));

        Self {
            export_failures,
            import_failures,
            succeeded,
            rejected,
            unresolved: outcome.unresolved,
            rounds: outcome.rounds,
        }
    }

    /// Whether every submitted import completed successfully.
    ///
    /// Export failures do not count: those routes never reached the target.
    pub fn is_clean(&self) -> bool {
        self.import_failures.is_empty() && self.rejected.is_empty() && self.unresolved.is_empty()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in self.export_failures.iter().chain(&self.import_failures) {
            writeln!(f, "{failure}")?;
        }

        for status in &self.rejected {
            let code = status
                .response_code
                .map_or_else(|| "unknown".to_string(), |code| code.to_string());
            let message = status.response_message.as_deref().unwrap_or("no message");
            writeln!(f, "job {} failed with code {code}: {message}", status.job_id)?;
        }

        if !self.unresolved.is_empty() {
            let ids = self
                .unresolved
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "jobs still unresolved after {} polling rounds: {ids}",
                self.rounds
            )?;
        }

        if self.is_clean() {
            writeln!(
                f,
                "all {} import jobs completed successfully",
                self.succeeded.len()
            )?;
        }

        Ok(())
    }
}
