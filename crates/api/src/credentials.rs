//! Ephemeral email-verification credentials.
//!
//! Two credential shapes are issued against the same identity:
//!
//! - **token** - 256-bit hex string delivered as a link, valid for 24 hours
//! - **code** - six-digit number typed in by hand, valid for 10 minutes
//!
//! An identity holds at most one live credential per kind. Verification is
//! single-use, `resend` hands back the live credential without extending
//! it, and a background [`Sweeper`] evicts what is no longer needed.
//!
//! ## Usage in Handlers
//!
//! ```ignore
//! let issued = state.credentials.issue(&email, CredentialKind::Code, payload).await?;
//! let notice = state.templates.verification_notice(&email, CredentialKind::Code, &issued, url)?;
//! state.email.send(&notice).await?;
//! ```

mod clock;
mod error;
mod keys;
mod model;
mod service;
mod sweeper;

pub use clock::{Clock, SystemClock};
pub use error::{IssueError, ResendError, VerifyError};
pub use keys::{KeyGenerator, RandomKeyGenerator};
pub use model::{
    CredentialKind, CredentialRecord, CredentialStatus, ExpiryPolicy, Issued, SweepReport,
    Verified,
};
pub use service::{CredentialService, MAX_KEY_ATTEMPTS, StoreSizes};
pub use sweeper::{MIN_SWEEP_PERIOD, Sweeper, SweeperHandle};

#[cfg(test)]
pub use clock::ManualClock;
#[cfg(test)]
pub use keys::MockKeyGenerator;
