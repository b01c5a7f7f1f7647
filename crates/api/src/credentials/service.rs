//! Issue, verify, resend and reclaim credentials over both stores.

use std::sync::Arc;

use anyhow::Result;

use super::{
    clock::{Clock, SystemClock},
    error::{IssueError, ResendError, VerifyError},
    keys::{KeyGenerator, RandomKeyGenerator},
    model::{
        CredentialKind, CredentialRecord, CredentialStatus, ExpiryPolicy, Issued, SweepReport,
        Verified,
    },
};
use crate::stores::{InsertOutcome, Stores, VerifyOutcome};

/// Fresh keys tried before giving up on a collision streak.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Record counts per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSizes {
    pub tokens: usize,
    pub codes: usize,
}

/// Façade over the token and code stores.
///
/// Mail delivery is not done here: `issue` and `resend` return the key and
/// expiry, and the caller renders and sends the notice.
pub struct CredentialService {
    stores: Stores,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
    keys: Arc<dyn KeyGenerator>,
}

impl CredentialService {
    pub fn new(stores: Stores, policy: ExpiryPolicy) -> Self {
        Self {
            stores,
            policy,
            clock: Arc::new(SystemClock),
            keys: Arc::new(RandomKeyGenerator),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    /// Mint a new credential for the identity.
    ///
    /// Fails with `AlreadyPending` if the identity already holds a live
    /// credential of this kind; the caller should offer a resend instead.
    pub async fn issue(
        &self,
        identity: &str,
        kind: CredentialKind,
        payload: serde_json::Value,
    ) -> Result<Issued, IssueError> {
        let store = self.stores.for_kind(kind);
        let now = self.clock.now();
        let window = self.policy.window(kind);

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let record = CredentialRecord::new(
                self.keys.generate(kind),
                identity,
                kind,
                payload.clone(),
                now,
                window,
            );
            let issued = Issued {
                key: record.key.clone(),
                expires_at: record.expires_at,
                payload: record.payload.clone(),
            };

            match store.insert_new(record, now).await? {
                InsertOutcome::Inserted => {
                    tracing::info!(
                        identity = %identity,
                        kind = %kind,
                        expires_at = %issued.expires_at,
                        "credential issued"
                    );
                    return Ok(issued);
                }
                InsertOutcome::KeyTaken => {
                    tracing::warn!(
                        kind = %kind,
                        attempt,
                        "generated credential key collided, retrying"
                    );
                }
                InsertOutcome::IdentityPending => {
                    tracing::info!(
                        identity = %identity,
                        kind = %kind,
                        "issue refused: credential already pending"
                    );
                    return Err(IssueError::AlreadyPending);
                }
            }
        }

        tracing::error!(
            identity = %identity,
            kind = %kind,
            attempts = MAX_KEY_ATTEMPTS,
            "credential key generation exhausted"
        );
        Err(IssueError::KeyGenerationExhausted(MAX_KEY_ATTEMPTS))
    }

    /// Consume a credential. Exactly one caller can succeed for a given key.
    pub async fn verify(&self, key: &str, kind: CredentialKind) -> Result<Verified, VerifyError> {
        let now = self.clock.now();

        match self.stores.for_kind(kind).mark_verified(key, now).await? {
            VerifyOutcome::Verified(record) => {
                tracing::info!(identity = %record.identity, kind = %kind, "credential verified");
                Ok(Verified {
                    identity: record.identity,
                    payload: record.payload,
                })
            }
            VerifyOutcome::NotFound => {
                tracing::warn!(kind = %kind, "verification failed: unknown credential");
                Err(VerifyError::NotFound)
            }
            VerifyOutcome::Expired => {
                tracing::warn!(kind = %kind, "verification failed: credential expired");
                Err(VerifyError::Expired)
            }
            VerifyOutcome::AlreadyVerified => {
                tracing::warn!(kind = %kind, "verification failed: credential already used");
                Err(VerifyError::AlreadyVerified)
            }
        }
    }

    /// Hand back the live credential unchanged. The expiry is not extended.
    pub async fn resend(
        &self,
        identity: &str,
        kind: CredentialKind,
    ) -> Result<Issued, ResendError> {
        let now = self.clock.now();

        match self
            .stores
            .for_kind(kind)
            .find_by_identity(identity, now)
            .await?
        {
            Some(record) => {
                tracing::info!(identity = %identity, kind = %kind, "credential resent");
                Ok(Issued {
                    key: record.key,
                    expires_at: record.expires_at,
                    payload: record.payload,
                })
            }
            None => Err(ResendError::NoPendingCredential),
        }
    }

    /// Where the identity stands across both kinds.
    ///
    /// Reports the most recently issued live credential if there is one,
    /// otherwise the most recently verified one. Expired, unverified records
    /// are ignored.
    pub async fn status(&self, identity: &str) -> Result<Option<CredentialStatus>> {
        let now = self.clock.now();

        let mut records = self.stores.tokens.records_for_identity(identity).await?;
        records.extend(self.stores.codes.records_for_identity(identity).await?);

        let is_verified = records.iter().any(|r| r.verified);
        let chosen = records
            .iter()
            .filter(|r| r.is_live(now))
            .max_by_key(|r| r.issued_at)
            .or_else(|| {
                records
                    .iter()
                    .filter(|r| r.verified)
                    .max_by_key(|r| r.verified_at)
            });

        Ok(chosen.map(|r| CredentialStatus {
            has_pending: r.is_live(now),
            is_verified,
            kind: r.kind,
            expires_at: r.expires_at,
        }))
    }

    /// Drop every record of both kinds for the identity.
    pub async fn purge(&self, identity: &str) -> Result<()> {
        let tokens = self.stores.tokens.delete_by_identity(identity).await?;
        let codes = self.stores.codes.delete_by_identity(identity).await?;

        tracing::info!(identity = %identity, tokens, codes, "credentials purged");
        Ok(())
    }

    /// Evict dead records from both stores.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let retention = self.policy.verified_retention;

        Ok(SweepReport {
            tokens: self.stores.tokens.sweep_expired(now, retention).await?,
            codes: self.stores.codes.sweep_expired(now, retention).await?,
        })
    }

    pub async fn sizes(&self) -> Result<StoreSizes> {
        Ok(StoreSizes {
            tokens: self.stores.tokens.len().await?,
            codes: self.stores.codes.len().await?,
        })
    }
}
