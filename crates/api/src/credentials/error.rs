//! Typed failures returned by the credential service.
//!
//! Every variant is an expected outcome that maps to its own user-facing
//! message. `Store` carries a backend failure and is the only one that is
//! not about the credential itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("a live credential is already pending for this identity")]
    AlreadyPending,
    #[error("could not generate an unused key after {0} attempts")]
    KeyGenerationExhausted(usize),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("credential not found")]
    NotFound,
    #[error("credential expired")]
    Expired,
    #[error("credential already verified")]
    AlreadyVerified,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ResendError {
    #[error("no pending credential for this identity")]
    NoPendingCredential,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
