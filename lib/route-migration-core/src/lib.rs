//! # Route Migration Core
//!
//! Copy routes from a source ERP system into a target ERP system.
//!
//! A run goes through three strictly sequential stages:
//!
//! 1. **Export**: every route is fetched from the source system, all requests
//!    in flight at the same time.
//! 2. **Import**: every successful export is submitted to the target system,
//!    which answers with a job id.
//! 3. **Polling**: job statuses are polled in batches until each job carries a
//!    response code or the attempt budget runs out.
//!
//! Failures of a single route never stop the run: they are collected as
//! [`FailureRecord`]s and printed with the [`MigrationReport`]. Only an
//! authentication failure or a run without any job to poll aborts with a
//! [`MigrationError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use route_migration_core::{MigrationConfig, Pipeline, read_route_ids};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MigrationConfig::from_env()?;
//! let route_ids = read_route_ids("routes.txt")?;
//!
//! let pipeline = Pipeline::from_config(&config)?;
//! let report = pipeline.run(&route_ids).await?;
//! print!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! Both systems use a password grant (see [`token`]). Tokens are cached for the
//! whole run and each system is authenticated at most once, even when many
//! requests need a token at the same time.

pub mod client;
pub mod config;
mod error;
pub mod export;
pub mod import;
mod model;
pub mod pipeline;
pub mod poller;
mod report;
mod route_ids;
pub mod token;

pub use self::client::ApiClientError;
pub use self::config::{ConfigError, MigrationConfig, SystemConfig};
pub use self::error::{CallError, MigrationError};
pub use self::model::{
    FailureRecord, ImportResult, JobId, JobStatus, RouteExport, RouteId, Stage, System,
};
pub use self::pipeline::Pipeline;
pub use self::poller::{BackoffStrategy, CompletionPoller, PollOutcome, PollerConfig};
pub use self::report::MigrationReport;
pub use self::route_ids::read_route_ids;
