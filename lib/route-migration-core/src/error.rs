use std::path::PathBuf;

use serde_json::Value;

use crate::client::ApiClientError;
use crate::config::ConfigError;
use crate::model::FailureRecord;
use crate::token::TokenError;

/// Why a single export or import call failed.
///
/// These errors never leave their stage: they end up as a [`FailureRecord`].
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum CallError {
    /// No bearer token could be obtained.
    Authentication(TokenError),

    /// The HTTP call failed.
    Client(ApiClientError),

    /// The import response carries no job id.
    #[display("response has no jobId: {response}")]
    #[from(skip)]
    MissingJobId {
        /// The response as received.
        response: Value,
    },
}

/// Errors aborting a whole migration run.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum MigrationError {
    /// Authentication against one of the systems failed.
    Authentication(TokenError),

    /// Authentication against the target system failed after the export stage.
    #[display("{source}")]
    #[from(skip)]
    TargetAuthentication {
        /// The authentication failure.
        source: TokenError,
        /// Routes that could not be exported.
        export_failures: Vec<FailureRecord>,
    },

    /// The configuration is incomplete or invalid.
    Configuration(ConfigError),

    /// Building an HTTP client failed.
    Client(ApiClientError),

    /// The route id file cannot be read.
    #[display("Cannot read route ids from '{}': {source}", path.display())]
    #[from(skip)]
    RouteIdsUnreadable {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The route id file holds no route id.
    #[display("No route id found in '{}'", path.display())]
    #[from(skip)]
    NoRouteIds {
        /// The file that was read.
        path: PathBuf,
    },

    /// No import produced a job id, there is nothing to poll.
    #[display(
        "No import job was created ({} export failures, {} import failures)",
        export_failures.len(),
        import_failures.len()
    )]
    #[from(skip)]
    NoJobsToPoll {
        /// Routes that could not be exported.
        export_failures: Vec<FailureRecord>,
        /// Routes that could not be imported.
        import_failures: Vec<FailureRecord>,
    },
}

impl MigrationError {
    /// Per-route failures collected before the run was aborted.
    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        let (export_failures, import_failures): (&[FailureRecord], &[FailureRecord]) = match self {
            Self::TargetAuthentication {
                export_failures, ..
            } => (export_failures, &[]),
            Self::NoJobsToPoll {
                export_failures,
                import_failures,
            } => (export_failures, import_failures),
            _ => (&[], &[]),
        };
        export_failures.iter().chain(import_failures)
    }
}
