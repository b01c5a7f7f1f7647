//! Credential storage.
//!
//! One store instance holds one kind of credential. Expiry is never applied
//! implicitly on reads: `get` returns an expired record as-is so callers can
//! tell "expired" apart from "never existed".

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::credentials::CredentialRecord;

/// Keys removed per write-lock acquisition during a sweep.
const SWEEP_BATCH: usize = 256;

/// Result of an atomic insert of a freshly issued record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The generated key is already present; the caller should pick another.
    KeyTaken,
    /// The identity already holds a live record in this store.
    IdentityPending,
}

/// Result of the verify check-and-set.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Verified(CredentialRecord),
    NotFound,
    /// The record was past its expiry and has been removed.
    Expired,
    AlreadyVerified,
}

/// Store for credential records of a single kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert or overwrite a record under its key.
    async fn put(&self, record: CredentialRecord) -> Result<()>;

    /// Insert a new record unless its key is taken or its identity already
    /// holds a live record. Both checks and the insert happen atomically.
    async fn insert_new(&self, record: CredentialRecord, now: DateTime<Utc>)
    -> Result<InsertOutcome>;

    /// Get a record by key, expired or not.
    async fn get(&self, key: &str) -> Result<Option<CredentialRecord>>;

    /// Delete a record by key. No error if absent.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Most recently issued live record for the identity.
    async fn find_by_identity(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CredentialRecord>>;

    /// Every record held for the identity, in any state.
    async fn records_for_identity(&self, identity: &str) -> Result<Vec<CredentialRecord>>;

    /// Verify a key as a single critical section: not found, already
    /// verified, expired (and removed), or flipped to verified.
    async fn mark_verified(&self, key: &str, now: DateTime<Utc>) -> Result<VerifyOutcome>;

    /// Delete every record for the identity, returning how many were removed.
    async fn delete_by_identity(&self, identity: &str) -> Result<usize>;

    /// Remove records that are expired and unverified, or verified longer
    /// ago than `retention`. Returns the number removed.
    async fn sweep_expired(&self, now: DateTime<Utc>, retention: Duration) -> Result<usize>;

    /// Number of records currently held.
    async fn len(&self) -> Result<usize>;
}

/// In-process implementation of CredentialStore.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(&self, record: CredentialRecord) -> Result<()> {
        anyhow::ensure!(!record.key.is_empty(), "credential key must not be empty");

        self.records.write().insert(record.key.clone(), record);
        Ok(())
    }

    async fn insert_new(
        &self,
        record: CredentialRecord,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        anyhow::ensure!(!record.key.is_empty(), "credential key must not be empty");

        let mut records = self.records.write();

        if records
            .values()
            .any(|r| r.identity == record.identity && r.is_live(now))
        {
            return Ok(InsertOutcome::IdentityPending);
        }

        if records.contains_key(&record.key) {
            return Ok(InsertOutcome::KeyTaken);
        }

        records.insert(record.key.clone(), record);
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, key: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }

    async fn find_by_identity(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CredentialRecord>> {
        let records = self.records.read();

        Ok(records
            .values()
            .filter(|r| r.identity == identity && r.is_live(now))
            .max_by_key(|r| r.issued_at)
            .cloned())
    }

    async fn records_for_identity(&self, identity: &str) -> Result<Vec<CredentialRecord>> {
        let records = self.records.read();

        Ok(records
            .values()
            .filter(|r| r.identity == identity)
            .cloned()
            .collect())
    }

    async fn mark_verified(&self, key: &str, now: DateTime<Utc>) -> Result<VerifyOutcome> {
        let mut records = self.records.write();

        let Some(record) = records.get_mut(key) else {
            return Ok(VerifyOutcome::NotFound);
        };

        if record.verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        if record.is_expired(now) {
            records.remove(key);
            return Ok(VerifyOutcome::Expired);
        }

        record.mark_verified(now);
        Ok(VerifyOutcome::Verified(record.clone()))
    }

    async fn delete_by_identity(&self, identity: &str) -> Result<usize> {
        let mut records = self.records.write();
        let before = records.len();

        records.retain(|_, r| r.identity != identity);
        Ok(before - records.len())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, retention: Duration) -> Result<usize> {
        // Mark under the read lock, then delete in short write-locked batches
        // so verifiers are never stalled for the length of a whole sweep.
        let doomed: Vec<String> = self
            .records
            .read()
            .values()
            .filter(|r| r.is_sweepable(now, retention))
            .map(|r| r.key.clone())
            .collect();

        let mut removed = 0;
        for batch in doomed.chunks(SWEEP_BATCH) {
            let mut records = self.records.write();
            for key in batch {
                // Re-check: the record may have been verified or replaced since it was marked.
                if records
                    .get(key)
                    .is_some_and(|r| r.is_sweepable(now, retention))
                {
                    records.remove(key);
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }
}
