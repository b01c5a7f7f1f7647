//! Credential records and the values the service hands back to callers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
pub use shared::api::CredentialKind;

/// A single issued credential.
///
/// The record carries its own key so a store can hand back the key when it
/// is found by identity. `payload` is opaque and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub key: String,
    pub identity: String,
    pub kind: CredentialKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}

impl CredentialRecord {
    pub fn new(
        key: String,
        identity: &str,
        kind: CredentialKind,
        payload: serde_json::Value,
        issued_at: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        Self {
            key,
            identity: identity.to_string(),
            kind,
            issued_at,
            expires_at: issued_at + window,
            verified: false,
            verified_at: None,
            payload,
        }
    }

    /// Neither verified nor expired.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.verified && now < self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a sweep may evict this record: expired while unverified, or
    /// verified longer ago than `retention`.
    pub fn is_sweepable(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match self.verified_at {
            Some(verified_at) if self.verified => now >= verified_at + retention,
            _ => self.is_expired(now),
        }
    }

    /// Flip to verified. Callers must hold the store's write lock.
    pub(crate) fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.verified = true;
        self.verified_at = Some(now.max(self.issued_at));
    }
}

/// Expiry windows per kind plus how long verified records are retained.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    pub token: Duration,
    pub code: Duration,
    pub verified_retention: Duration,
}

impl ExpiryPolicy {
    pub fn window(&self, kind: CredentialKind) -> Duration {
        match kind {
            CredentialKind::Token => self.token,
            CredentialKind::Code => self.code,
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            token: Duration::hours(24),
            code: Duration::minutes(10),
            verified_retention: Duration::hours(1),
        }
    }
}

/// What a caller needs to render a verification notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    pub key: String,
    pub expires_at: DateTime<Utc>,
    /// Payload stored at issuance, unmodified.
    pub payload: serde_json::Value,
}

/// Returned by a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified {
    pub identity: String,
    pub payload: serde_json::Value,
}

/// Read-only view of where an identity stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub has_pending: bool,
    pub is_verified: bool,
    pub kind: CredentialKind,
    pub expires_at: DateTime<Utc>,
}

/// Records removed by one sweep, per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tokens: usize,
    pub codes: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.tokens + self.codes
    }
}
