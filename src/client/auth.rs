//! Credential management
//!
//! Mints HS256 JSON Web Tokens signed with the API secret and caches them
//! until they expire. Without a secret, authentication is disabled and no
//! token is ever produced.

use super::error::{ClientError, ClientResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Claims carried by the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches signed, time-limited bearer tokens
pub struct TokenManager {
    key: Option<EncodingKey>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    /// Create a manager. `None` (or an empty secret) disables authentication.
    pub fn new(secret: Option<&str>, ttl: Duration) -> Self {
        Self::with_clock(secret, ttl, Arc::new(SystemClock))
    }

    /// Create a manager reading time from `clock`
    pub fn with_clock(secret: Option<&str>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map(|s| EncodingKey::from_secret(s.as_bytes()));

        Self {
            key,
            ttl,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Whether requests will carry an `Authorization` header
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Expiry of the cached token, if one has been minted
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|cached| cached.expires_at)
    }

    /// Return the cached token, minting a fresh one when none is cached or
    /// the cached one has expired. Returns `None` when authentication is
    /// disabled.
    pub fn current_token(&self) -> ClientResult<Option<String>> {
        let Some(key) = &self.key else {
            return Ok(None);
        };

        // Read, check, mint and store under one lock
        let mut cached = self.lock();
        let now = self.clock.now();

        if let Some(existing) = cached.as_ref() {
            if existing.expires_at > now {
                return Ok(Some(existing.token.clone()));
            }
        }

        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(ClientError::TokenLifetime {
                ttl_secs: self.ttl.num_seconds(),
            })?;
        let claims = TokenClaims {
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, key)?;

        tracing::debug!(expires_at = %expires_at, "Minted API token");

        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(Some(token))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CachedToken>> {
        // The guarded value is always consistent, so a poisoned lock is usable
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
