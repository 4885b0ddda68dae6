//! Submitting routes to the target system and reading back job statuses.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ApiClientError, ErpClient, ErpRequest};
use crate::error::CallError;
use crate::model::{FailureRecord, ImportResult, JobId, JobStatus, RouteExport};
use crate::poller::JobStatusSource;
use crate::token::TokenCache;

const SCHEDULER_SERVICE: &str = "erp-scheduler-service";
const IMPORT_ORDERS: &str = "importOrders";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportRouteJob<'a> {
    /// The exported document, serialized as a JSON string.
    message: &'a str,
    upgrade_segments_document: bool,
}

/// Imports exported routes into the target system.
#[derive(Debug, Clone)]
pub struct Importer {
    client: ErpClient,
    tokens: Arc<TokenCache>,
}

impl Importer {
    /// Creates an importer; `client` must be bound to the target system.
    pub fn new(client: ErpClient, tokens: Arc<TokenCache>) -> Self {
        Self { client, tokens }
    }

    /// Posts the export to `{target}/erp-scheduler-service/importOrders/importRouteJobs`.
    ///
    /// The document travels as a JSON string in the `message` field. The returned
    /// [`ImportResult`] has no job id when the response shape was unexpected.
    /// Transport and HTTP failures only concern this route: they are returned as a
    /// [`FailureRecord`] and never abort sibling imports.
    pub async fn import_route(&self, export: &RouteExport) -> Result<ImportResult, FailureRecord> {
        let route_id = &export.route_id;
        match self.submit(&export.document).await {
            Ok(raw_response) => {
                let job_id = job_id_of(&raw_response);
                debug!(%route_id, ?job_id, "route submitted");
                Ok(ImportResult {
                    route_id: route_id.clone(),
                    job_id,
                    raw_response,
                })
            }
            Err(error) => {
                warn!(%route_id, %error, "route import failed");
                debug!(%route_id, payload = %export.document, "rejected payload");
                Err(FailureRecord::import(route_id.clone(), error))
            }
        }
    }

    async fn submit(&self, document: &Value) -> Result<Value, CallError> {
        let token = self.tokens.token(self.client.system()).await?;
        let message = serde_json::to_string(document).map_err(ApiClientError::from)?;
        let body = ImportRouteJob {
            message: &message,
            upgrade_segments_document: false,
        };
        let url = self
            .client
            .url([SCHEDULER_SERVICE, IMPORT_ORDERS, "importRouteJobs"])?;
        let request = ErpRequest::post(url)
            .with_authentication(token.authentication())
            .with_json(&body)?;

        let response = self.client.exchange(request).await?;
        Ok(response)
    }
}

/// Reads job statuses with a single batched call to
/// `{target}/erp-scheduler-service/importOrders/importedJobs?jobIds=..&jobIds=..`.
impl JobStatusSource for Importer {
    async fn fetch_statuses(&self, job_ids: &[JobId]) -> Result<Vec<JobStatus>, CallError> {
        let token = self.tokens.token(self.client.system()).await?;
        let query = job_ids
            .iter()
            .map(|job_id| ("jobIds", job_id.get()))
            .collect::<Vec<_>>();
        let url = self
            .client
            .url([SCHEDULER_SERVICE, IMPORT_ORDERS, "importedJobs"])?;
        let request = ErpRequest::get(url)
            .with_authentication(token.authentication())
            .with_query(&query)?;

        let statuses = self.client.exchange(request).await?;
        Ok(statuses)
    }
}

/// Extracts the `jobId` of an import response.
///
/// Integer ids are expected; a numeric string is accepted as well.
fn job_id_of(response: &Value) -> Option<JobId> {
    let job_id = response.get("jobId")?;
    job_id
        .as_i64()
        .or_else(|| job_id.as_str().and_then(|text| text.trim().parse().ok()))
        .map(JobId::from)
}
