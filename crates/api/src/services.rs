//! External service abstractions.
//!
//! The credential core never sends mail itself. Handlers render a notice
//! with [`templates`] and hand it to an [`EmailSender`], which is a trait so
//! tests can mock delivery.
//!
//! ## Services
//!
//! - **email** - Transactional email via Resend (prod) or SMTP (dev)
//! - **templates** - Subject/body rendering for verification and welcome notices

mod email;
pub mod templates;

pub use email::{EmailMessage, EmailSender, EmailSenderImpl};

#[cfg(test)]
pub use email::MockEmailSender;
