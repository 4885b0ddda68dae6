//! Bearer tokens and their per-system cache.

use std::fmt;

use tokio::sync::OnceCell;
use tracing::debug;

use super::error::TokenError;
use super::provider::TokenProvider;
use crate::System;
use crate::client::{Authentication, SecureString};

/// A bearer credential for one system.
#[derive(Clone)]
pub struct BearerToken {
    system: System,
    access_token: SecureString,
}

impl BearerToken {
    /// Wraps an access token obtained from `system`.
    pub fn new(system: System, access_token: impl Into<SecureString>) -> Self {
        Self {
            system,
            access_token: access_token.into(),
        }
    }

    /// The system that issued this token.
    pub fn system(&self) -> System {
        self.system
    }

    /// The `Authorization: Bearer` authentication for this token.
    pub fn authentication(&self) -> Authentication {
        Authentication::Bearer(self.access_token.clone())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("system", &self.system)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug)]
struct SystemTokens {
    provider: TokenProvider,
    cell: OnceCell<BearerToken>,
}

impl SystemTokens {
    fn new(provider: TokenProvider) -> Self {
        Self {
            provider,
            cell: OnceCell::new(),
        }
    }
}

/// Process-wide token cache, one entry per system.
///
/// A token is fetched on first use and reused for the rest of the run; there is
/// no refresh. Concurrent first accesses for the same system share a single
/// in-flight request. If that request fails the entry stays empty and the next
/// caller tries again.
#[derive(Debug)]
pub struct TokenCache {
    source: SystemTokens,
    target: SystemTokens,
}

impl TokenCache {
    /// Creates an empty cache.
    pub fn new(source: TokenProvider, target: TokenProvider) -> Self {
        Self {
            source: SystemTokens::new(source),
            target: SystemTokens::new(target),
        }
    }

    fn entry(&self, system: System) -> &SystemTokens {
        match system {
            System::Source => &self.source,
            System::Target => &self.target,
        }
    }

    /// Returns the token of `system`, authenticating on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] of the authentication request.
    pub async fn token(&self, system: System) -> Result<BearerToken, TokenError> {
        let entry = self.entry(system);
        let token = entry
            .cell
            .get_or_try_init(|| async {
                debug!(%system, "no cached token");
                entry.provider.acquire_token().await
            })
            .await?;
        Ok(token.clone())
    }
}
