//! The export, import and polling stages chained together.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::System;
use crate::client::{ErpClient, http_client};
use crate::config::MigrationConfig;
use crate::error::{CallError, MigrationError};
use crate::export::Exporter;
use crate::import::Importer;
use crate::model::{FailureRecord, JobId, RouteExport, RouteId};
use crate::poller::CompletionPoller;
use crate::report::MigrationReport;
use crate::token::{TokenCache, TokenProvider};

/// Migrates routes from the source system to the target system.
///
/// Stages run strictly one after the other; inside a stage every route is
/// handled concurrently on the current task.
#[derive(Debug)]
pub struct Pipeline {
    tokens: Arc<TokenCache>,
    exporter: Exporter,
    importer: Importer,
    poller: CompletionPoller<Importer>,
    success_code: i64,
}

impl Pipeline {
    /// Wires clients, token cache and stages from `config`.
    ///
    /// No request is sent yet.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or a base URL is invalid.
    pub fn from_config(config: &MigrationConfig) -> Result<Self, MigrationError> {
        let http = http_client(config.request_timeout)?;
        let source = ErpClient::new(System::Source, &config.source.base_url, http.clone())?;
        let target = ErpClient::new(System::Target, &config.target.base_url, http)?;

        let tokens = Arc::new(TokenCache::new(
            TokenProvider::new(source.clone(), config.source.grant.clone()),
            TokenProvider::new(target.clone(), config.target.grant.clone()),
        ));
        let exporter = Exporter::new(source, Arc::clone(&tokens));
        let importer = Importer::new(target, Arc::clone(&tokens));
        let poller = CompletionPoller::new(importer.clone(), config.poller);

        Ok(Self {
            tokens,
            exporter,
            importer,
            poller,
            success_code: config.success_code,
        })
    }

    /// Runs the whole migration for `route_ids`.
    ///
    /// Per-route failures are collected in the report. Unresolved jobs are
    /// reported as well, the run still completes.
    ///
    /// # Errors
    ///
    /// Fails if authentication against either system fails, or if no import
    /// produced a job to poll. Failures collected before the abort are kept
    /// in the error, see [`MigrationError::failures`].
    pub async fn run(&self, route_ids: &[RouteId]) -> Result<MigrationReport, MigrationError> {
        info!(routes = route_ids.len(), "starting migration");

        self.tokens.token(System::Source).await?;
        let (exports, export_failures) = self.export_all(route_ids).await;
        info!(
            exported = exports.len(),
            failed = export_failures.len(),
            "export stage done"
        );

        if exports.is_empty() {
            return Err(MigrationError::NoJobsToPoll {
                export_failures,
                import_failures: Vec::new(),
            });
        }

        if let Err(source) = self.tokens.token(System::Target).await {
            return Err(MigrationError::TargetAuthentication {
                source,
                export_failures,
            });
        }
        let (job_ids, import_failures) = self.import_all(&exports).await;
        info!(
            submitted = job_ids.len(),
            failed = import_failures.len(),
            "import stage done"
        );

        if job_ids.is_empty() {
            return Err(MigrationError::NoJobsToPoll {
                export_failures,
                import_failures,
            });
        }

        let outcome = self.poller.poll_until_resolved(job_ids).await;
        let report = MigrationReport::new(
            export_failures,
            import_failures,
            outcome,
            self.success_code,
        );
        info!(
            succeeded = report.succeeded.len(),
            rejected = report.rejected.len(),
            unresolved = report.unresolved.len(),
            "migration done"
        );

        Ok(report)
    }

    async fn export_all(&self, route_ids: &[RouteId]) -> (Vec<RouteExport>, Vec<FailureRecord>) {
        let results = join_all(
            route_ids
                .iter()
                .cloned()
                .map(|route_id| self.exporter.export_route(route_id)),
        )
        .await;

        let mut exports = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(export) => exports.push(export),
                Err(failure) => failures.push(failure),
            }
        }
        (exports, failures)
    }

    async fn import_all(&self, exports: &[RouteExport]) -> (Vec<JobId>, Vec<FailureRecord>) {
        let results = join_all(
            exports
                .iter()
                .map(|export| self.importer.import_route(export)),
        )
        .await;

        let mut job_ids = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(imported) => match imported.job_id {
                    Some(job_id) => job_ids.push(job_id),
                    None => {
                        let route_id = imported.route_id;
                        warn!(%route_id, response = %imported.raw_response, "import response has no job id");
                        let error = CallError::MissingJobId {
                            response: imported.raw_response,
                        };
                        failures.push(FailureRecord::import(route_id, error));
                    }
                },
                Err(failure) => failures.push(failure),
            }
        }
        (job_ids, failures)
    }
}
