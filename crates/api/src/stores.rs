//! Ephemeral credential stores.
//!
//! Each credential kind gets its own store so the two expiry policies never
//! share a keyspace. Records live in process memory for the life of the
//! process; nothing is persisted.
//!
//! ## Stores
//!
//! - **tokens** - opaque link tokens (24 hour window by default)
//! - **codes** - six-digit codes (10 minute window by default)
//!
//! Both are `Arc<dyn CredentialStore>` so a shared key-value backend can be
//! dropped in without touching the service.

mod credentials;

pub use credentials::{CredentialStore, InsertOutcome, MemoryCredentialStore, VerifyOutcome};

#[cfg(test)]
pub use credentials::MockCredentialStore;

use std::sync::Arc;

use crate::credentials::CredentialKind;

/// Collection of all credential stores.
#[derive(Clone)]
pub struct Stores {
    pub tokens: Arc<dyn CredentialStore>,
    pub codes: Arc<dyn CredentialStore>,
}

impl Stores {
    /// Fresh in-memory stores for both kinds.
    pub fn in_memory() -> Self {
        Self {
            tokens: Arc::new(MemoryCredentialStore::new()),
            codes: Arc::new(MemoryCredentialStore::new()),
        }
    }

    pub fn for_kind(&self, kind: CredentialKind) -> &Arc<dyn CredentialStore> {
        match kind {
            CredentialKind::Token => &self.tokens,
            CredentialKind::Code => &self.codes,
        }
    }
}
