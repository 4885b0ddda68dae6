#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::info;

use route_migration_core::MigrationConfig;

/// How long a stalled export waits before answering.
pub const STALL: Duration = Duration::from_secs(30);

/// How a job evolves when its status is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobScript {
    /// Resolves on the given status query (1 based) with a code and message.
    ResolveAt {
        query: usize,
        code: i64,
        message: &'static str,
    },
    /// Never gets a response code.
    Never,
}

impl Default for JobScript {
    fn default() -> Self {
        Self::ResolveAt {
            query: 1,
            code: 200,
            message: "imported",
        }
    }
}

/// Knobs of the mock ERP systems.
#[derive(Debug, Clone, Default)]
pub struct ErpBehavior {
    /// Route ids whose export answers 500.
    pub failing_exports: HashSet<&'static str>,
    /// Route ids whose export never answers in time.
    pub stalled_exports: HashSet<&'static str>,
    /// Route ids whose import answers 500.
    pub failing_imports: HashSet<&'static str>,
    /// Route ids whose import answers without `jobId`.
    pub imports_without_job_id: HashSet<&'static str>,
    /// Systems whose token endpoint answers 401.
    pub rejected_logins: HashSet<&'static str>,
    /// Per route job evolution, default resolves with 200 on the first query.
    pub jobs: HashMap<&'static str, JobScript>,
    /// Latency of the token endpoint.
    pub token_delay: Duration,
}

impl ErpBehavior {
    pub fn with_failing_export(mut self, route_id: &'static str) -> Self {
        self.failing_exports.insert(route_id);
        self
    }

    pub fn with_stalled_export(mut self, route_id: &'static str) -> Self {
        self.stalled_exports.insert(route_id);
        self
    }

    pub fn with_failing_import(mut self, route_id: &'static str) -> Self {
        self.failing_imports.insert(route_id);
        self
    }

    pub fn with_import_without_job_id(mut self, route_id: &'static str) -> Self {
        self.imports_without_job_id.insert(route_id);
        self
    }

    pub fn with_rejected_login(mut self, system: &'static str) -> Self {
        self.rejected_logins.insert(system);
        self
    }

    pub fn with_job(mut self, route_id: &'static str, script: JobScript) -> Self {
        self.jobs.insert(route_id, script);
        self
    }

    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Recorder {
    token_requests: HashMap<String, Vec<TokenRequest>>,
    exports: Vec<String>,
    imports: Vec<Value>,
    status_queries: Vec<Vec<i64>>,
    jobs: HashMap<i64, String>,
    job_polls: HashMap<i64, usize>,
}

/// A token request as received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub authorization: Option<String>,
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
struct ErpState {
    behavior: ErpBehavior,
    recorder: Mutex<Recorder>,
}

type SharedState = Arc<ErpState>;

/// Source and target ERP systems served on one local port, under `/source` and `/target`.
#[derive(Debug)]
pub struct MockErp {
    addr: SocketAddr,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl MockErp {
    pub async fn start(behavior: ErpBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(ErpState {
            behavior,
            recorder: Mutex::default(),
        });
        let router = Router::new()
            .route("/{system}/uaa/oauth/token", post(token))
            .route(
                "/source/erp-export-service/exportRoutes/{route_id}",
                get(export_route),
            )
            .route(
                "/target/erp-scheduler-service/importOrders/importRouteJobs",
                post(import_route),
            )
            .route(
                "/target/erp-scheduler-service/importOrders/importedJobs",
                get(imported_jobs),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        info!(%addr, "mock ERP listening");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("mock ERP server");
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn base_url(&self, system: &str) -> String {
        format!("http://{}/{system}", self.addr)
    }

    /// A configuration pointing at this mock, with fast polling.
    pub fn config(&self) -> MigrationConfig {
        let env = HashMap::from([
            ("SOURCE_BASE_QUERY_URL".to_string(), self.base_url("source")),
            ("SOURCE_USERNAME".to_string(), "alice".to_string()),
            ("SOURCE_PASSWORD".to_string(), "source-pass".to_string()),
            ("SOURCE_CLIENT_ID".to_string(), "source-client".to_string()),
            ("SOURCE_CLIENT_SECRET".to_string(), "source-secret".to_string()),
            ("TARGET_BASE_QUERY_URL".to_string(), self.base_url("target")),
            ("TARGET_USERNAME".to_string(), "bob".to_string()),
            ("TARGET_PASSWORD".to_string(), "target-pass".to_string()),
            ("TARGET_CLIENT_ID".to_string(), "target-client".to_string()),
            ("TARGET_CLIENT_SECRET".to_string(), "target-secret".to_string()),
            ("MIGRATION_POLL_BASE_DELAY_MS".to_string(), "10".to_string()),
            ("MIGRATION_REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
        ]);
        MigrationConfig::from_lookup(|name| env.get(name).cloned()).expect("valid mock config")
    }

    fn recorder(&self) -> std::sync::MutexGuard<'_, Recorder> {
        self.state.recorder.lock().expect("recorder lock")
    }

    pub fn token_requests(&self, system: &str) -> Vec<TokenRequest> {
        self.recorder()
            .token_requests
            .get(system)
            .cloned()
            .unwrap_or_default()
    }

    pub fn exports(&self) -> Vec<String> {
        self.recorder().exports.clone()
    }

    pub fn imports(&self) -> Vec<Value> {
        self.recorder().imports.clone()
    }

    pub fn status_queries(&self) -> Vec<Vec<i64>> {
        self.recorder().status_queries.clone()
    }

    /// The job id assigned to the import of `route_id`.
    pub fn job_of(&self, route_id: &str) -> Option<i64> {
        self.recorder()
            .jobs
            .iter()
            .find_map(|(job_id, route)| (route == route_id).then_some(*job_id))
    }
}

impl Drop for MockErp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Deserialize)]
struct PasswordGrant {
    grant_type: String,
    username: String,
    password: String,
}

async fn token(
    State(state): State<SharedState>,
    Path(system): Path<String>,
    headers: HeaderMap,
    Form(grant): Form<PasswordGrant>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    state
        .recorder
        .lock()
        .expect("recorder lock")
        .token_requests
        .entry(system.clone())
        .or_default()
        .push(TokenRequest {
            authorization,
            grant_type: grant.grant_type,
            username: grant.username,
            password: grant.password,
        });

    tokio::time::sleep(state.behavior.token_delay).await;

    if state.behavior.rejected_logins.contains(system.as_str()) {
        return (StatusCode::UNAUTHORIZED, "Bad credentials").into_response();
    }
    Json(json!({
        "access_token": format!("{system}-token"),
        "token_type": "bearer",
        "expires_in": 3600
    }))
    .into_response()
}

fn has_bearer(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {expected}"))
}

async fn export_route(
    State(state): State<SharedState>,
    Path(route_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !has_bearer(&headers, "source-token") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state
        .recorder
        .lock()
        .expect("recorder lock")
        .exports
        .push(route_id.clone());

    if state.behavior.stalled_exports.contains(route_id.as_str()) {
        tokio::time::sleep(STALL).await;
    }
    if state.behavior.failing_exports.contains(route_id.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "export exploded").into_response();
    }
    Json(json!({
        "routeId": route_id,
        "segments": [{"from": "A", "to": "B"}],
        "version": 3
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRouteJob {
    message: String,
    upgrade_segments_document: bool,
}

async fn import_route(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(job): Json<ImportRouteJob>,
) -> Response {
    if !has_bearer(&headers, "target-token") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Ok(document) = serde_json::from_str::<Value>(&job.message) else {
        return (StatusCode::BAD_REQUEST, "message is not JSON").into_response();
    };
    let route_id = document["routeId"].as_str().unwrap_or_default().to_string();

    let mut recorder = state.recorder.lock().expect("recorder lock");
    recorder.imports.push(json!({
        "document": document,
        "upgradeSegmentsDocument": job.upgrade_segments_document,
    }));

    if state.behavior.failing_imports.contains(route_id.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "import exploded").into_response();
    }
    if state
        .behavior
        .imports_without_job_id
        .contains(route_id.as_str())
    {
        return Json(json!({"status": "queued"})).into_response();
    }

    let job_id = 1000 + i64::try_from(recorder.jobs.len()).expect("few jobs");
    recorder.jobs.insert(job_id, route_id);
    Json(json!({"jobId": job_id})).into_response()
}

async fn imported_jobs(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !has_bearer(&headers, "target-token") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let job_ids = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == "jobIds")
        .filter_map(|(_, value)| value.parse::<i64>().ok())
        .collect::<Vec<_>>();

    let mut recorder = state.recorder.lock().expect("recorder lock");
    recorder.status_queries.push(job_ids.clone());

    let mut statuses = Vec::with_capacity(job_ids.len());
    for job_id in job_ids {
        let Some(route_id) = recorder.jobs.get(&job_id).cloned() else {
            continue;
        };
        let polls = recorder.job_polls.entry(job_id).or_default();
        *polls += 1;
        let polls = *polls;

        let script = state
            .behavior
            .jobs
            .get(route_id.as_str())
            .cloned()
            .unwrap_or_default();
        let status = match script {
            JobScript::ResolveAt {
                query,
                code,
                message,
            } if polls >= query => json!({
                "jobId": job_id,
                "responseCode": code,
                "responseMessage": message
            }),
            _ => json!({"jobId": job_id, "responseCode": null, "responseMessage": null}),
        };
        statuses.push(status);
    }
    Json(statuses).into_response()
}
