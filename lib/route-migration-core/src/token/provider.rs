//! Token acquisition through the password grant.

use serde::Deserialize;
use tracing::{debug, info};

use super::cache::BearerToken;
use super::config::PasswordGrantConfig;
use super::error::TokenError;
use crate::client::{ApiClientError, ErpClient, ErpRequest};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Fetches bearer tokens from the token endpoint of one system.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: ErpClient,
    grant: PasswordGrantConfig,
}

impl TokenProvider {
    /// Creates a provider authenticating with `grant` against the system of `client`.
    pub fn new(client: ErpClient, grant: PasswordGrantConfig) -> Self {
        Self { client, grant }
    }

    /// Requests a new access token.
    ///
    /// Sends `POST {base}/{token_path}` with the password grant form and the
    /// client credentials as Basic authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token endpoint URL cannot be built
    /// - the request fails or the system answers with a non-2xx status
    /// - the response carries no `access_token`
    pub async fn acquire_token(&self) -> Result<BearerToken, TokenError> {
        let system = self.client.system();
        let url = self
            .client
            .url(self.grant.token_segments())
            .map_err(|err| TokenError::InvalidTokenEndpoint {
                system,
                reason: err.to_string(),
            })?;
        debug!(%system, %url, username = %self.grant.username, "requesting token");

        let acquisition_failed = |err: ApiClientError| TokenError::TokenAcquisitionFailed {
            system,
            reason: err.to_string(),
        };
        let request = ErpRequest::post(url)
            .with_authentication(self.grant.client_authentication())
            .with_form(&self.grant.grant_form())
            .map_err(acquisition_failed)?;
        let response = self
            .client
            .exchange::<TokenResponse>(request)
            .await
            .map_err(acquisition_failed)?;

        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::MissingAccessToken { system })?;
        info!(%system, "authenticated");

        Ok(BearerToken::new(system, access_token))
    }
}
