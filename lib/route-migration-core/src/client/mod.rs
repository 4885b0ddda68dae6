//! HTTP plumbing shared by every call made to an ERP system.
//!
//! An [`ErpClient`] is bound to one [`System`]: it owns the base URL of that
//! system and a clone of the process-wide [`reqwest::Client`]. Requests are
//! described with [`ErpRequest`] and executed with [`ErpClient::exchange`], which
//! validates the status code and decodes the JSON body.

use std::time::Duration;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method};
use reqwest::{Body, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::System;

mod auth;
pub use self::auth::{Authentication, AuthenticationError, SecureString};

mod error;
pub use self::error::ApiClientError;

/// Maximum length of a response body kept in an error.
pub(crate) const BODY_MAX_LENGTH: usize = 1024;

/// Default timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client shared by both systems.
///
/// Every request gets `timeout`, so a stalled call fails instead of holding its
/// fan-out barrier open.
///
/// # Errors
///
/// Fails if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ApiClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .build()?;
    Ok(client)
}

/// Client bound to the base URL of one ERP system.
#[derive(Debug, Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    system: System,
    base_url: Url,
}

impl ErpClient {
    /// Creates a client for `system` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` is not an absolute URL that can carry path segments.
    pub fn new(
        system: System,
        base_url: &str,
        http: reqwest::Client,
    ) -> Result<Self, ApiClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                error: "URL cannot be a base".to_string(),
            });
        }
        Ok(Self {
            http,
            system,
            base_url,
        })
    }

    /// The system this client talks to.
    pub fn system(&self) -> System {
        self.system
    }

    /// Appends path segments to the base URL.
    ///
    /// Each segment is percent-encoded, so a segment containing `/` stays a single
    /// segment.
    ///
    /// # Errors
    ///
    /// Fails if the base URL cannot carry path segments.
    pub fn url<I>(&self, segments: I) -> Result<Url, ApiClientError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                error: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and decodes a successful JSON response.
    ///
    /// # Errors
    ///
    /// Fails on transport errors and timeouts, on a non-2xx status (with the
    /// truncated body), or when the body does not decode as `T`.
    pub async fn exchange<T>(&self, request: ErpRequest) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let request = request.build()?;
        debug!(system = %self.system, method = %request.method(), url = %request.url(), "sending...");
        let response = self.http.execute(request).await?;
        debug!(system = %self.system, status = %response.status(), "...receiving");

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map(|text| truncate_body(&text))
                .unwrap_or_else(|err| format!("<unable to read response body: {err}>"));
            return Err(ApiClientError::UnexpectedStatusCode {
                status_code: status.as_u16(),
                body,
            });
        }

        let path = response.url().path().to_string();
        let text = response.text().await?;
        deserialize_json(&path, &text)
    }
}

/// A request to an ERP system, built before it is sent.
#[derive(Debug)]
pub struct ErpRequest {
    method: Method,
    url: Url,
    authentication: Option<Authentication>,
    body: Option<(HeaderValue, Vec<u8>)>,
}

impl ErpRequest {
    /// A `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A `POST` request.
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            authentication: None,
            body: None,
        }
    }

    /// Sets the `Authorization` header.
    #[must_use]
    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// Replaces the query string.
    ///
    /// Sequences of pairs are supported, so a key may repeat.
    ///
    /// # Errors
    ///
    /// Fails if `query` cannot be URL-encoded.
    pub fn with_query<Q>(mut self, query: &Q) -> Result<Self, ApiClientError>
    where
        Q: Serialize + ?Sized,
    {
        let query = serde_urlencoded::to_string(query)?;
        self.url.set_query((!query.is_empty()).then_some(query.as_str()));
        Ok(self)
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Fails if `body` cannot be serialized.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(body)?;
        self.body = Some((HeaderValue::from_static("application/json"), data));
        Ok(self)
    }

    /// Sets a `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Fails if `form` cannot be URL-encoded.
    pub fn with_form<F>(mut self, form: &F) -> Result<Self, ApiClientError>
    where
        F: Serialize + ?Sized,
    {
        let data = serde_urlencoded::to_string(form)?;
        self.body = Some((
            HeaderValue::from_static("application/x-www-form-urlencoded"),
            data.into_bytes(),
        ));
        Ok(self)
    }

    pub(crate) fn build(self) -> Result<Request, ApiClientError> {
        let Self {
            method,
            url,
            authentication,
            body,
        } = self;

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(auth) = authentication {
            let (name, value) = auth.to_header()?;
            headers.insert(name, value);
        }

        if let Some((content_type, data)) = body {
            headers.insert(CONTENT_TYPE, content_type);
            *request.body_mut() = Some(Body::from(data));
        }

        Ok(request)
    }
}

fn deserialize_json<T>(path: &str, json: &str) -> Result<T, ApiClientError>
where
    T: DeserializeOwned,
{
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(deserializer).map_err(|err| ApiClientError::JsonError {
        path: format!("{path}: {}", err.path()),
        error: err.into_inner(),
        body: truncate_body(json),
    })
}

fn truncate_body(text: &str) -> String {
    if text.len() <= BODY_MAX_LENGTH {
        return text.to_string();
    }
    let mut end = BODY_MAX_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", text.get(..end).unwrap_or_default())
}
