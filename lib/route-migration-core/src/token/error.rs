//! Authentication errors.

use std::fmt;

use crate::System;

/// Errors that can occur while obtaining a bearer token.
///
/// Any of them is fatal to a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token request failed in transport or was rejected by the system.
    TokenAcquisitionFailed {
        /// The system that was asked for a token.
        system: System,
        /// Description of the failure.
        reason: String,
    },

    /// The token endpoint answered without an `access_token`.
    MissingAccessToken {
        /// The system that was asked for a token.
        system: System,
    },

    /// The token endpoint URL cannot be built.
    InvalidTokenEndpoint {
        /// The system whose endpoint is invalid.
        system: System,
        /// Description of why the URL is invalid.
        reason: String,
    },
}

impl std::error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenAcquisitionFailed { system, reason } => {
                write!(f, "Authentication against the {system} system failed: {reason}")
            }
            Self::MissingAccessToken { system } => {
                write!(
                    f,
                    "The {system} system token response has no access_token"
                )
            }
            Self::InvalidTokenEndpoint { system, reason } => {
                write!(f, "Invalid {system} token endpoint: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_token_acquisition_failed() {
        let error = TokenError::TokenAcquisitionFailed {
            system: System::Source,
            reason: "Unexpected status code 401: bad credentials".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Authentication against the source system failed: Unexpected status code 401: bad credentials"
        );
    }

    #[test]
    fn should_display_missing_access_token() {
        let error = TokenError::MissingAccessToken {
            system: System::Target,
        };
        assert_eq!(
            error.to_string(),
            "The target system token response has no access_token"
        );
    }
}
