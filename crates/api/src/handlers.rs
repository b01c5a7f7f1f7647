//! HTTP handlers. Thin glue between requests, the credential service and
//! the mail transport.

pub mod health;
pub mod verification;
