//! Shared test utilities for API handler tests.
//!
//! Provides a test configuration and a `TestStateBuilder` for constructing
//! `AppState` with only the mocks each test needs.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::TestStateBuilder;
//!
//! let mut sender = MockEmailSender::new();
//! sender.expect_send().returning(|_| Ok(()));
//!
//! let state = TestStateBuilder::new()
//!     .with_email_sender(sender)
//!     .build();
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{CredentialService, ExpiryPolicy};
use crate::services::{MockEmailSender, templates::Templates};
use crate::state::AppState;
use crate::stores::Stores;

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        public_url: "https://shop.example.com".to_string(),
        smtp_url: None,
        resend_api_key: None,
        mail_from: "Storefront <noreply@example.com>".to_string(),
        env: "test".to_string(),
        sentry_dsn: None,
        token_ttl_secs: 24 * 60 * 60,
        code_ttl_secs: 10 * 60,
        verified_retention_secs: 60 * 60,
        sweep_interval_secs: 60,
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses an in-memory credential service with default expiry windows and an
/// email mock with no expectations (any send panics) unless overridden.
pub struct TestStateBuilder {
    credentials: Option<CredentialService>,
    email_sender: Option<MockEmailSender>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            credentials: None,
            email_sender: None,
        }
    }

    pub fn with_credentials(mut self, service: CredentialService) -> Self {
        self.credentials = Some(service);
        self
    }

    pub fn with_email_sender(mut self, sender: MockEmailSender) -> Self {
        self.email_sender = Some(sender);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let credentials = self.credentials.unwrap_or_else(|| {
            CredentialService::new(Stores::in_memory(), ExpiryPolicy::default())
        });

        let email = Arc::new(self.email_sender.unwrap_or_else(MockEmailSender::new))
            as Arc<dyn crate::services::EmailSender>;

        AppState {
            config: test_config(),
            credentials: Arc::new(credentials),
            email,
            templates: Arc::new(Templates::new().unwrap()),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
