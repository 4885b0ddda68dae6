//! Password grant credentials.

use std::fmt;

use crate::client::{Authentication, SecureString};

/// Default token endpoint path, relative to the system base URL.
pub const DEFAULT_TOKEN_PATH: &str = "uaa/oauth/token";

/// Credentials for the OAuth-like password grant of one ERP system.
#[derive(Clone)]
pub struct PasswordGrantConfig {
    /// Client id, sent as the Basic auth username.
    pub(crate) client_id: String,
    /// Client secret, sent as the Basic auth password.
    pub(crate) client_secret: SecureString,
    /// Resource owner username.
    pub(crate) username: String,
    /// Resource owner password.
    pub(crate) password: SecureString,
    /// Token endpoint path relative to the base URL.
    pub(crate) token_path: String,
}

impl PasswordGrantConfig {
    /// Creates a config targeting [`DEFAULT_TOKEN_PATH`].
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
        username: impl Into<String>,
        password: impl Into<SecureString>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
        }
    }

    /// Overrides the token endpoint path.
    #[must_use]
    pub fn with_token_path(mut self, token_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self
    }

    /// The token endpoint path relative to the base URL.
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    /// Path segments of the token endpoint.
    pub(crate) fn token_segments(&self) -> impl Iterator<Item = &str> {
        self.token_path
            .split('/')
            .filter(|segment| !segment.is_empty())
    }

    /// The Basic authentication carrying the client credentials.
    pub(crate) fn client_authentication(&self) -> Authentication {
        Authentication::Basic {
            username: self.client_id.clone(),
            password: self.client_secret.clone(),
        }
    }

    /// The form fields of the password grant.
    pub(crate) fn grant_form(&self) -> [(&'static str, &str); 3] {
        [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ]
    }
}

impl fmt::Debug for PasswordGrantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordGrantConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token_path", &self.token_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PasswordGrantConfig {
        PasswordGrantConfig::new("client-id", "client-secret", "migrator", "hunter22")
    }

    #[test]
    fn should_default_to_uaa_token_path() {
        let config = config();

        let segments = config.token_segments().collect::<Vec<_>>();

        assert_eq!(segments, vec!["uaa", "oauth", "token"]);
    }

    #[test]
    fn should_split_custom_token_path() {
        let config = config().with_token_path("/erp-export-service/token/");

        let segments = config.token_segments().collect::<Vec<_>>();

        assert_eq!(segments, vec!["erp-export-service", "token"]);
    }

    #[test]
    fn should_build_password_grant_form() {
        let config = config();

        assert_eq!(
            config.grant_form(),
            [
                ("grant_type", "password"),
                ("username", "migrator"),
                ("password", "hunter22"),
            ]
        );
    }

    #[test]
    fn should_redact_debug_output() {
        let debug_str = format!("{:?}", config());

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("client-secret"));
        assert!(!debug_str.contains("hunter22"));
    }
}
