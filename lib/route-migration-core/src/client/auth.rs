use std::fmt;

use base64::Engine;
use http::HeaderValue;
use reqwest::header::{AUTHORIZATION, HeaderName};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors raised while building an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// Bearer token contains invalid characters for HTTP headers.
    #[display("Bearer token contains invalid characters: {message}")]
    InvalidBearerToken {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// Basic authentication username (the client id) contains invalid characters.
    #[display("Basic auth username contains invalid characters: {message}")]
    InvalidUsername {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// Basic authentication password (the client secret) contains invalid characters.
    #[display("Basic auth password contains invalid characters: {message}")]
    InvalidPassword {
        /// Description of the invalid characters or format issue.
        message: String,
    },
}

/// Secret string that zeroes its memory on drop and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps a secret value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the secret value.
    ///
    /// Do not keep the returned reference around longer than needed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masks a secret for logging purposes.
    fn mask_sensitive(value: &str) -> String {
        let count = value.chars().count();
        if count <= 8 {
            return "***".to_string();
        }
        let head = value.chars().take(4).collect::<String>();
        let tail = value.chars().skip(count - 4).collect::<String>();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// Authorization scheme attached to an ERP request.
///
/// The token endpoint is called with [`Authentication::Basic`] built from the
/// client id and secret; every other call uses [`Authentication::Bearer`] with the
/// token it returned.
#[derive(Clone)]
pub enum Authentication {
    /// Adds `Authorization: Bearer <token>`.
    Bearer(SecureString),

    /// Adds `Authorization: Basic <base64(username:password)>`.
    Basic {
        /// The username, for the ERP token endpoint this is the client id.
        username: String,
        /// The password, for the ERP token endpoint this is the client secret.
        password: SecureString,
    },
}

impl Authentication {
    /// Converts the authentication into an HTTP header.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthenticationError`] if the credentials cannot be carried by an HTTP header.
    pub fn to_header(&self) -> Result<(HeaderName, HeaderValue), AuthenticationError> {
        match self {
            Self::Bearer(token) => {
                let header_value = format!("Bearer {}", token.as_str());
                let mut value = HeaderValue::from_str(&header_value).map_err(|err| {
                    AuthenticationError::InvalidBearerToken {
                        message: err.to_string(),
                    }
                })?;
                value.set_sensitive(true);
                Ok((AUTHORIZATION, value))
            }

            Self::Basic { username, password } => {
                if username.contains(':') {
                    return Err(AuthenticationError::InvalidUsername {
                        message: "Username cannot contain colon (:) character".to_string(),
                    });
                }

                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{}", password.as_str()));
                let mut value =
                    HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|err| {
                        AuthenticationError::InvalidPassword {
                            message: err.to_string(),
                        }
                    })?;
                value.set_sensitive(true);
                Ok((AUTHORIZATION, value))
            }
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"[REDACTED]").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(token) => write!(f, "Bearer {token}"),
            Self::Basic { username, .. } => write!(f, "Basic (username: {username})"),
        }
    }
}
