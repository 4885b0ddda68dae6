//! Fetching routes from the source system.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ErpClient, ErpRequest};
use crate::error::CallError;
use crate::model::{FailureRecord, RouteExport, RouteId};
use crate::token::TokenCache;

/// Exports routes from the source system, one call per route.
#[derive(Debug, Clone)]
pub struct Exporter {
    client: ErpClient,
    tokens: Arc<TokenCache>,
}

impl Exporter {
    /// Creates an exporter; `client` must be bound to the source system.
    pub fn new(client: ErpClient, tokens: Arc<TokenCache>) -> Self {
        Self { client, tokens }
    }

    /// Fetches `GET {source}/erp-export-service/exportRoutes/{route_id}`.
    ///
    /// A failure only concerns this route: it is returned as a [`FailureRecord`]
    /// and never aborts sibling exports.
    pub async fn export_route(&self, route_id: RouteId) -> Result<RouteExport, FailureRecord> {
        match self.fetch(&route_id).await {
            Ok(document) => {
                debug!(%route_id, "route exported");
                Ok(RouteExport { route_id, document })
            }
            Err(error) => {
                warn!(%route_id, %error, "route export failed");
                Err(FailureRecord::export(route_id, error))
            }
        }
    }

    async fn fetch(&self, route_id: &RouteId) -> Result<Value, CallError> {
        let token = self.tokens.token(self.client.system()).await?;
        let url = self
            .client
            .url(["erp-export-service", "exportRoutes", route_id.as_str()])?;
        let request = ErpRequest::get(url).with_authentication(token.authentication());

        let document = self.client.exchange(request).await?;
        Ok(document)
    }
}
