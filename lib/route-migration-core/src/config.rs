//! Run configuration read from environment variables.
//!
//! Each system is configured with variables sharing its prefix
//! ([`System::env_prefix`]):
//!
//! | variable             | required | meaning                                  |
//! |----------------------|----------|------------------------------------------|
//! | `<P>BASE_QUERY_URL`  | yes      | base URL of the system                   |
//! | `<P>USERNAME`        | yes      | resource owner username                  |
//! | `<P>PASSWORD`        | yes      | resource owner password                  |
//! | `<P>CLIENT_ID`       | yes      | OAuth client id                          |
//! | `<P>CLIENT_SECRET`   | yes      | OAuth client secret                      |
//! | `<P>TOKEN_PATH`      | no       | token endpoint, `uaa/oauth/token`        |
//!
//! Run tuning is optional: `MIGRATION_POLL_MAX_ATTEMPTS`,
//! `MIGRATION_POLL_BASE_DELAY_MS`, `MIGRATION_POLL_BACKOFF`,
//! `MIGRATION_REQUEST_TIMEOUT_SECS` and `MIGRATION_SUCCESS_CODE`.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::System;
use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::poller::PollerConfig;
use crate::token::PasswordGrantConfig;

const POLL_MAX_ATTEMPTS: &str = "MIGRATION_POLL_MAX_ATTEMPTS";
const POLL_BASE_DELAY_MS: &str = "MIGRATION_POLL_BASE_DELAY_MS";
const POLL_BACKOFF: &str = "MIGRATION_POLL_BACKOFF";
const REQUEST_TIMEOUT_SECS: &str = "MIGRATION_REQUEST_TIMEOUT_SECS";
const SUCCESS_CODE: &str = "MIGRATION_SUCCESS_CODE";

/// Response code of a successfully imported job.
pub const DEFAULT_SUCCESS_CODE: i64 = 200;

/// Configuration errors, always naming the offending variable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum ConfigError {
    /// A required variable is not set or blank.
    #[display("Missing environment variable {name}")]
    MissingVariable {
        /// Variable name.
        name: String,
    },

    /// A variable cannot be parsed.
    #[display("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
        /// Parse error.
        reason: String,
    },
}

/// Connection settings of one ERP system.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Password grant credentials.
    pub grant: PasswordGrantConfig,
}

impl SystemConfig {
    fn from_lookup<F>(system: System, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = system.env_prefix();
        let var = |suffix: &str| required(lookup, &format!("{prefix}{suffix}"));

        let base_url = var("BASE_QUERY_URL")?;
        let grant = PasswordGrantConfig::new(
            var("CLIENT_ID")?,
            var("CLIENT_SECRET")?,
            var("USERNAME")?,
            var("PASSWORD")?,
        );
        let grant = match optional(lookup, &format!("{prefix}TOKEN_PATH")) {
            Some(token_path) => grant.with_token_path(token_path),
            None => grant,
        };

        Ok(Self { base_url, grant })
    }
}

/// Everything a migration run needs.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// The system routes are exported from.
    pub source: SystemConfig,
    /// The system routes are imported into.
    pub target: SystemConfig,
    /// Polling of import jobs.
    pub poller: PollerConfig,
    /// Timeout of every HTTP request.
    pub request_timeout: Duration,
    /// Job response code counted as success.
    pub success_code: i64,
}

impl MigrationConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails on a missing required variable or an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Fails on a missing required variable or an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = SystemConfig::from_lookup(System::Source, &lookup)?;
        let target = SystemConfig::from_lookup(System::Target, &lookup)?;

        let defaults = PollerConfig::default();
        let poller = PollerConfig {
            max_attempts: parsed(&lookup, POLL_MAX_ATTEMPTS)?.unwrap_or(defaults.max_attempts),
            base_delay: parsed(&lookup, POLL_BASE_DELAY_MS)?
                .map_or(defaults.base_delay, Duration::from_millis),
            backoff: parsed(&lookup, POLL_BACKOFF)?.unwrap_or(defaults.backoff),
        };
        let request_timeout = parsed(&lookup, REQUEST_TIMEOUT_SECS)?
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);
        let success_code = parsed(&lookup, SUCCESS_CODE)?.unwrap_or(DEFAULT_SUCCESS_CODE);

        Ok(Self {
            source,
            target,
            poller,
            request_timeout,
            success_code,
        })
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| ConfigError::MissingVariable {
        name: name.to_string(),
    })
}

fn parsed<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    optional(lookup, name)
        .map(|value| {
            value.parse().map_err(|error: T::Err| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: error.to_string(),
                value,
            })
        })
        .transpose()
}
