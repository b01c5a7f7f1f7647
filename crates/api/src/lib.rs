//! Email-verification credential service for the storefront.
//!
//! Issues single-use verification tokens and codes, validates them, and
//! evicts expired ones in the background. See [`credentials`] for the core
//! and [`handlers`] for the HTTP surface.

pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;
pub mod stores;
#[cfg(test)]
mod test_utils;
