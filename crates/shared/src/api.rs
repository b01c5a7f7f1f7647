//! Shared API request/response types used by the credential server and its clients.

use std::fmt;

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Shape of an email-verification credential.
///
/// Tokens are long opaque strings delivered as links and live for a day.
/// Codes are six digits typed in by hand and live for minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Token,
    Code,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Token => "token",
            CredentialKind::Code => "code",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request a verification credential for an email address.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct IssueCredentialPayload {
    #[garde(email)]
    pub email: String,
    #[garde(skip)]
    pub kind: CredentialKind,
    /// Display name used in the notice and handed back on verification.
    #[garde(length(min = 1, max = 100))]
    #[serde(default)]
    pub name: Option<String>,
}

/// Ask for the pending credential to be delivered again.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResendCredentialPayload {
    #[garde(email)]
    pub email: String,
    #[garde(skip)]
    pub kind: CredentialKind,
}

/// Present a token (from a link) or a code (typed in) for verification.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyCredentialPayload {
    #[garde(length(min = 6, max = 128), alphanumeric)]
    pub key: String,
    #[garde(skip)]
    pub kind: CredentialKind,
}

/// Returned after issuing or resending. The credential itself only travels by email.
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialSentResponse {
    pub kind: CredentialKind,
    pub expires_at: DateTime<Utc>,
}

/// Returned after a successful verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedResponse {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Query for the verification status of an email address.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StatusQuery {
    #[garde(email)]
    pub email: String,
}

/// Path parameters naming the email address whose credentials are purged.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PurgePath {
    #[garde(email)]
    pub email: String,
}

/// Verification status, used to decide between "verify", "resend" and "done" screens.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub has_pending: bool,
    pub is_verified: bool,
    pub kind: CredentialKind,
    pub expires_at: DateTime<Utc>,
}
