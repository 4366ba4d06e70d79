//! Expiring single-use preview tokens
//!
//! Each token moves `Active -> Consumed` or `Active -> Expired`; both are
//! terminal. Expiry is lazy: it is decided when the token is next touched,
//! never by a timer. Expired entries that nobody touches stay in memory until
//! [`PreviewTokenStore::purge_expired`] runs.

use crate::error::StateError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Default preview token lifetime
pub const DEFAULT_PREVIEW_TTL: Duration = Duration::from_secs(300);

/// Opaque preview token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewToken(Uuid);

impl PreviewToken {
    /// Fresh random token
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied token string
    ///
    /// # Errors
    /// `StateError::MalformedToken` if the string is not a token.
    pub fn parse(raw: &str) -> Result<Self, StateError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| StateError::MalformedToken(raw.to_string()))
    }
}

impl fmt::Display for PreviewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PreviewToken {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug)]
struct PendingEntry<P> {
    payload: P,
    created_at: Instant,
}

/// Concurrent store of preview payloads keyed by token
#[derive(Debug)]
pub struct PreviewTokenStore<P> {
    ttl: Duration,
    entries: DashMap<PreviewToken, PendingEntry<P>>,
}

impl<P> PreviewTokenStore<P> {
    /// Store with the given TTL
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Configured TTL
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[inline]
    fn is_expired(&self, entry: &PendingEntry<P>) -> bool {
        entry.created_at.elapsed() > self.ttl
    }

    /// Store `payload` under a new token
    pub fn create(&self, payload: P) -> PreviewToken {
        let token = PreviewToken::generate();
        self.entries.insert(
            token,
            PendingEntry {
                payload,
                created_at: Instant::now(),
            },
        );
        tracing::debug!(%token, "preview token created");
        token
    }

    /// Remove `token` and return its payload, at most once
    ///
    /// Returns `None` for unknown, consumed or expired tokens. An expired
    /// token is removed as a side effect.
    pub fn consume(&self, token: &PreviewToken) -> Option<P> {
        let (_, entry) = self.entries.remove(token)?;
        if self.is_expired(&entry) {
            tracing::debug!(%token, "preview token expired on consume");
            return None;
        }
        Some(entry.payload)
    }

    /// Parse and consume in one step
    ///
    /// # Errors
    /// - `StateError::MalformedToken` if `raw` is not a token
    /// - `StateError::InvalidOrExpiredToken` if it cannot be consumed
    pub fn redeem(&self, raw: &str) -> Result<P, StateError> {
        let token = PreviewToken::parse(raw)?;
        self.consume(&token).ok_or(StateError::InvalidOrExpiredToken)
    }

    /// Drop every expired entry; returns how many were removed
    ///
    /// Optional housekeeping. Correctness never depends on it.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.created_at.elapsed() <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Entries currently held, including expired ones not yet touched
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Clone> PreviewTokenStore<P> {
    /// Read the payload without consuming it
    ///
    /// Returns `None` for unknown or consumed tokens. A token past its TTL
    /// is expired here and removed.
    pub fn peek(&self, token: &PreviewToken) -> Option<P> {
        match self.entries.get(token) {
            None => return None,
            Some(entry) if !self.is_expired(&entry) => return Some(entry.payload.clone()),
            Some(_) => {}
        }
        // shard read guard is released before removal
        self.entries.remove_if(token, |_, entry| self.is_expired(entry));
        tracing::debug!(%token, "preview token expired on peek");
        None
    }
}

impl<P> Default for PreviewTokenStore<P> {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_TTL)
    }
}
