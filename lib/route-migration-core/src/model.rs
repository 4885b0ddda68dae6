//! Values flowing through the migration pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the two ERP systems involved in a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum System {
    /// The system routes are exported from.
    #[display("source")]
    Source,
    /// The system routes are imported into.
    #[display("target")]
    Target,
}

impl System {
    /// Prefix of the environment variables configuring this system.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::Source => "SOURCE_",
            Self::Target => "TARGET_",
        }
    }
}

/// Identifier of a route in the source system.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::From,
)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RouteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of an import job in the target system.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct JobId(i64);

impl JobId {
    /// The raw identifier.
    pub fn get(self) -> i64 {
        self.0
    }
}

/// The document exported for one route, passed through to the importer untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteExport {
    /// The route this document was exported for.
    pub route_id: RouteId,
    /// The exported document.
    pub document: Value,
}

/// Response of the target system to an import submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    /// The route that was imported.
    pub route_id: RouteId,
    /// The job tracking the import, absent when the response had none.
    pub job_id: Option<JobId>,
    /// The response as received.
    pub raw_response: Value,
}

/// Status of an import job as reported by the target system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// The job this status is about.
    pub job_id: JobId,
    /// Outcome code, present once the job reached a terminal state.
    #[serde(default)]
    pub response_code: Option<i64>,
    /// Human readable outcome.
    #[serde(default)]
    pub response_message: Option<String>,
}

impl JobStatus {
    /// A job is resolved once its response code is known.
    pub fn is_resolved(&self) -> bool {
        self.response_code.is_some()
    }
}

/// Pipeline stage a [`FailureRecord`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Stage {
    /// Fetching the route from the source system.
    #[display("export")]
    Export,
    /// Submitting the route to the target system.
    #[display("import")]
    Import,
}

/// A per-route failure, reported at the end of the run.
///
/// Failures are identified by route id only. For an import, the rejected
/// payload is the export of that route; it is logged at `debug` level and not
/// kept here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Stage that failed.
    pub stage: Stage,
    /// Route that failed.
    pub route_id: RouteId,
    /// What went wrong.
    pub reason: String,
}

impl FailureRecord {
    /// A failed export.
    pub fn export(route_id: RouteId, reason: impl fmt::Display) -> Self {
        Self {
            stage: Stage::Export,
            route_id,
            reason: reason.to_string(),
        }
    }

    /// A failed import.
    pub fn import(route_id: RouteId, reason: impl fmt::Display) -> Self {
        Self {
            stage: Stage::Import,
            route_id,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for route {}: {}",
            self.stage, self.route_id, self.reason
        )
    }
}
