use super::AuthenticationError;

/// Errors raised by a single call to an ERP system.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Covers connection failures and per-request timeouts.
    ReqwestError(reqwest::Error),

    /// URL parsing error when constructing request URLs.
    UrlError(url::ParseError),

    /// The `Authorization` header could not be built.
    AuthenticationError(AuthenticationError),

    /// JSON serialization error for request bodies.
    JsonValueError(serde_json::Error),

    /// Query parameter serialization error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The configured base URL cannot carry path segments.
    #[display("Invalid base URL '{url}': {error}")]
    #[from(skip)]
    InvalidBaseUrl {
        /// The base URL that was configured.
        url: String,
        /// Description of why the base URL is invalid.
        error: String,
    },

    /// JSON response deserialization failure.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    JsonError {
        /// The JSON path where the error occurred.
        path: String,
        /// The underlying JSON parsing error.
        error: serde_json::Error,
        /// The response body that failed to parse.
        body: String,
    },

    /// Server answered with a non-2xx status code.
    #[display("Unexpected status code {status_code}: {body}")]
    #[from(skip)]
    UnexpectedStatusCode {
        /// The HTTP status code received.
        status_code: u16,
        /// The response body, truncated.
        body: String,
    },
}
