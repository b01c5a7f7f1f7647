use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::credentials::{IssueError, ResendError, VerifyError};

#[derive(Debug)]
pub enum AppError {
    /// Internal errors - logged but return generic 500 to user
    Internal(anyhow::Error),
    /// User-facing errors - message is safe to show
    External(StatusCode, &'static str),
    /// Validation errors - safe to show
    Validation(String),
}

impl AppError {
    pub fn from_issue(err: IssueError) -> Self {
        match err {
            IssueError::AlreadyPending => Self::External(
                StatusCode::CONFLICT,
                "A verification message is already on its way. Check your email or request a resend.",
            ),
            IssueError::KeyGenerationExhausted(_) => Self::Internal(err.into()),
            IssueError::Store(e) => Self::Internal(e),
        }
    }

    pub fn from_verify(err: VerifyError) -> Self {
        match err {
            VerifyError::NotFound => {
                Self::External(StatusCode::NOT_FOUND, "Invalid verification code or link")
            }
            VerifyError::Expired => Self::External(
                StatusCode::GONE,
                "This verification code or link has expired. Request a new one.",
            ),
            VerifyError::AlreadyVerified => {
                Self::External(StatusCode::CONFLICT, "This email address is already verified")
            }
            VerifyError::Store(e) => Self::Internal(e),
        }
    }

    pub fn from_resend(err: ResendError) -> Self {
        match err {
            ResendError::NoPendingCredential => Self::External(
                StatusCode::NOT_FOUND,
                "Nothing to resend. Request a new verification message.",
            ),
            ResendError::Store(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::External(status, msg) => (status, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
