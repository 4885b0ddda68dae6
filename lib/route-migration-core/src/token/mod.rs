//! Bearer token management for both ERP systems.
//!
//! Each system authenticates with an OAuth-like password grant:
//!
//! ```text
//! POST {base}/uaa/oauth/token
//! Authorization: Basic base64(client_id:client_secret)
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=password&username=...&password=...
//! ```
//!
//! The `access_token` of the response is then sent as `Authorization: Bearer`
//! on every call to that system. [`TokenCache`] memoizes it for the whole run and
//! guarantees a single in-flight authentication request per system.

mod cache;
mod config;
mod error;
mod provider;

pub use self::cache::{BearerToken, TokenCache};
pub use self::config::{DEFAULT_TOKEN_PATH, PasswordGrantConfig};
pub use self::error::TokenError;
pub use self::provider::TokenProvider;
