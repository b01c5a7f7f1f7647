use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::ExpiryPolicy;

/// Environment variable prefix, e.g. `CREDENTIALS_PORT`.
pub const ENV_PREFIX: &str = "CREDENTIALS_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the storefront; verification links point at `{public_url}/verify`.
    pub public_url: String,
    /// SMTP URL for development email (e.g., smtp://localhost:1025)
    #[serde(default)]
    pub smtp_url: Option<String>,
    /// Resend API key for production email
    #[serde(default)]
    pub resend_api_key: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,
    /// How long a verified credential is kept before the sweeper may drop it.
    #[serde(default = "default_verified_retention_secs")]
    pub verified_retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_mail_from() -> String {
    "Storefront <noreply@example.com>".to_string()
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_code_ttl_secs() -> u64 {
    10 * 60
}

fn default_verified_retention_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            token: secs(self.token_ttl_secs),
            code: secs(self.code_ttl_secs),
            verified_retention: secs(self.verified_retention_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        // tokio intervals panic on a zero period
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Upper bound for any configured window, so expiry arithmetic cannot overflow.
const MAX_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

fn secs(value: u64) -> chrono::Duration {
    let secs = i64::try_from(value).map_or(MAX_WINDOW_SECS, |v| v.min(MAX_WINDOW_SECS));
    chrono::Duration::seconds(secs)
}
