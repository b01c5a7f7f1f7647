//! Email verification endpoints.
//!
//! Flow:
//! 1. Client requests a credential via POST /verification with email + kind
//! 2. A token (link) or six-digit code is issued and mailed; the key never
//!    appears in the response
//! 3. Client presents the key to POST /verification/verify
//! 4. On success a welcome notice is sent and the identity is returned
//! 5. Once the surrounding flow completes, DELETE /verification/{email}
//!    frees the identity's records
//!
//! Notes:
//! - A second request while a credential is pending gets 409; use
//!   POST /verification/resend, which mails the same credential again
//! - Resending never extends the expiry
//! - Emails are trimmed and lower-cased before use as the identity

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use garde::Validate;
use serde_json::json;
use shared::api::{
    CredentialSentResponse, IssueCredentialPayload, PurgePath, ResendCredentialPayload,
    StatusQuery, StatusResponse, VerifiedResponse, VerifyCredentialPayload,
};

use crate::{error::AppError, services::templates, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(issue_credential))
        .route("/resend", post(resend_credential))
        .route("/verify", post(verify_credential))
        .route("/status", get(credential_status))
        .route("/{email}", delete(purge_credentials))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[debug_handler]
async fn issue_credential(
    State(state): State<AppState>,
    Json(payload): Json<IssueCredentialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let email = normalize_email(&payload.email);
    let credential_payload = match &payload.name {
        Some(name) => json!({ "name": name }),
        None => json!({}),
    };

    let issued = state
        .credentials
        .issue(&email, payload.kind, credential_payload)
        .await
        .map_err(AppError::from_issue)?;

    let notice = state.templates.verification_notice(
        &email,
        payload.kind,
        &issued,
        &state.config.public_url,
    )?;
    state.email.send(&notice).await?;

    tracing::info!(email = %email, kind = %payload.kind, "verification requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(CredentialSentResponse {
            kind: payload.kind,
            expires_at: issued.expires_at,
        }),
    ))
}

#[debug_handler]
async fn resend_credential(
    State(state): State<AppState>,
    Json(payload): Json<ResendCredentialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let email = normalize_email(&payload.email);

    let issued = state
        .credentials
        .resend(&email, payload.kind)
        .await
        .map_err(AppError::from_resend)?;

    let notice = state.templates.verification_notice(
        &email,
        payload.kind,
        &issued,
        &state.config.public_url,
    )?;
    state.email.send(&notice).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CredentialSentResponse {
            kind: payload.kind,
            expires_at: issued.expires_at,
        }),
    ))
}

#[debug_handler]
async fn verify_credential(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCredentialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let verified = state
        .credentials
        .verify(&payload.key, payload.kind)
        .await
        .map_err(AppError::from_verify)?;

    // The credential is consumed at this point; a mail failure must not undo that.
    let sent = match state
        .templates
        .welcome_notice(&verified.identity, &verified.payload)
    {
        Ok(welcome) => state.email.send(&welcome).await,
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        tracing::error!(email = %verified.identity, error = %e, "failed to send welcome email");
    }

    Ok(Json(VerifiedResponse {
        name: templates::display_name(&verified.payload).map(str::to_string),
        email: verified.identity,
    }))
}

#[debug_handler]
async fn credential_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    match state
        .credentials
        .status(&normalize_email(&query.email))
        .await?
    {
        Some(status) => Ok(Json(StatusResponse {
            has_pending: status.has_pending,
            is_verified: status.is_verified,
            kind: status.kind,
            expires_at: status.expires_at,
        })),
        None => Err(AppError::External(
            StatusCode::NOT_FOUND,
            "No verification in progress",
        )),
    }
}

#[debug_handler]
async fn purge_credentials(
    State(state): State<AppState>,
    Path(path): Path<PurgePath>,
) -> Result<impl IntoResponse, AppError> {
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .credentials
        .purge(&normalize_email(&path.email))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialKind, CredentialService, ExpiryPolicy, ManualClock};
    use crate::services::{EmailMessage, MockEmailSender};
    use crate::stores::Stores;
    use crate::test_utils::TestStateBuilder;
    use chrono::Utc;
    use std::sync::Arc;

    fn recording_sender() -> (MockEmailSender, Arc<parking_lot::Mutex<Vec<EmailMessage>>>) {
        let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = sent.clone();

        let mut sender = MockEmailSender::new();
        sender.expect_send().returning(move |message| {
            log.lock().push(message.clone());
            Ok(())
        });

        (sender, sent)
    }

    fn issue_payload(email: &str, kind: CredentialKind) -> IssueCredentialPayload {
        IssueCredentialPayload {
            email: email.to_string(),
            kind,
            name: Some("Alice".to_string()),
        }
    }

    #[tokio::test]
    async fn issue_mails_code_and_hides_it_from_response() {
        let (sender, sent) = recording_sender();
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        let response = issue_credential(
            State(state.clone()),
            Json(issue_payload("Alice@Example.com", CredentialKind::Code)),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].text.starts_with("Hi Alice,"));

        let status = state
            .credentials
            .status("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(status.has_pending);
        assert_eq!(status.kind, CredentialKind::Code);
    }

    #[tokio::test]
    async fn issue_rejects_invalid_email() {
        let state = TestStateBuilder::new().build();

        let result = issue_credential(
            State(state),
            Json(issue_payload("not-an-email", CredentialKind::Code)),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn second_issue_conflicts_without_sending() {
        let mut sender = MockEmailSender::new();
        sender.expect_send().times(1).returning(|_| Ok(()));
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        issue_credential(
            State(state.clone()),
            Json(issue_payload("a@x.com", CredentialKind::Token)),
        )
        .await
        .unwrap();

        let second = issue_credential(
            State(state),
            Json(issue_payload("a@x.com", CredentialKind::Token)),
        )
        .await;

        assert!(matches!(
            second,
            Err(AppError::External(StatusCode::CONFLICT, _))
        ));
    }

    #[tokio::test]
    async fn resend_mails_the_same_code() {
        let (sender, sent) = recording_sender();
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        let issued = state
            .credentials
            .issue("a@x.com", CredentialKind::Code, json!({}))
            .await
            .unwrap();

        let response = resend_credential(
            State(state),
            Json(ResendCredentialPayload {
                email: "a@x.com".to_string(),
                kind: CredentialKind::Code,
            }),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(sent.lock()[0].text.contains(&issued.key));
    }

    #[tokio::test]
    async fn resend_keeps_the_display_name() {
        let (sender, sent) = recording_sender();
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        issue_credential(
            State(state.clone()),
            Json(issue_payload("a@x.com", CredentialKind::Token)),
        )
        .await
        .unwrap();

        resend_credential(
            State(state),
            Json(ResendCredentialPayload {
                email: "a@x.com".to_string(),
                kind: CredentialKind::Token,
            }),
        )
        .await
        .unwrap();

        let sent = sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].text.starts_with("Hi Alice,"));
        assert_eq!(sent[0].text, sent[1].text);
    }

    #[tokio::test]
    async fn resend_without_pending_is_not_found() {
        let state = TestStateBuilder::new().build();

        let result = resend_credential(
            State(state),
            Json(ResendCredentialPayload {
                email: "a@x.com".to_string(),
                kind: CredentialKind::Token,
            }),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::NOT_FOUND, _))
        ));
    }

    #[tokio::test]
    async fn verify_sends_welcome_once() {
        let (sender, sent) = recording_sender();
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        let issued = state
            .credentials
            .issue("a@x.com", CredentialKind::Code, json!({ "name": "A" }))
            .await
            .unwrap();

        let payload = || VerifyCredentialPayload {
            key: issued.key.clone(),
            kind: CredentialKind::Code,
        };

        let response = verify_credential(State(state.clone()), Json(payload()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let again = verify_credential(State(state), Json(payload())).await;
        assert!(matches!(
            again,
            Err(AppError::External(StatusCode::CONFLICT, _))
        ));

        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Welcome!");
    }

    #[tokio::test]
    async fn verify_stands_when_welcome_mail_fails() {
        let mut sender = MockEmailSender::new();
        sender
            .expect_send()
            .returning(|_| Err(anyhow::anyhow!("smtp down")));
        let state = TestStateBuilder::new().with_email_sender(sender).build();

        let issued = state
            .credentials
            .issue("a@x.com", CredentialKind::Token, json!({}))
            .await
            .unwrap();

        let result = verify_credential(
            State(state.clone()),
            Json(VerifyCredentialPayload {
                key: issued.key,
                kind: CredentialKind::Token,
            }),
        )
        .await;

        assert!(result.is_ok());
        let status = state.credentials.status("a@x.com").await.unwrap().unwrap();
        assert!(status.is_verified);
    }

    #[tokio::test]
    async fn verify_unknown_code_is_not_found() {
        let state = TestStateBuilder::new().build();

        let result = verify_credential(
            State(state),
            Json(VerifyCredentialPayload {
                key: "123456".to_string(),
                kind: CredentialKind::Code,
            }),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::NOT_FOUND, _))
        ));
    }

    #[tokio::test]
    async fn verify_expired_code_is_gone() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = CredentialService::new(Stores::in_memory(), ExpiryPolicy::default())
            .with_clock(clock.clone());
        let state = TestStateBuilder::new().with_credentials(service).build();

        let issued = state
            .credentials
            .issue("a@x.com", CredentialKind::Code, json!({}))
            .await
            .unwrap();
        clock.advance(chrono::Duration::minutes(11));

        let result = verify_credential(
            State(state),
            Json(VerifyCredentialPayload {
                key: issued.key,
                kind: CredentialKind::Code,
            }),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::GONE, _))
        ));
    }

    #[tokio::test]
    async fn status_unknown_email_is_not_found() {
        let state = TestStateBuilder::new().build();

        let result = credential_status(
            State(state),
            Query(StatusQuery {
                email: "nobody@x.com".to_string(),
            }),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::NOT_FOUND, _))
        ));
    }

    #[tokio::test]
    async fn purge_frees_the_identity() {
        let state = TestStateBuilder::new().build();
        state
            .credentials
            .issue("a@x.com", CredentialKind::Code, json!({}))
            .await
            .unwrap();

        let response = purge_credentials(
            State(state.clone()),
            Path(PurgePath {
                email: "A@x.com".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.credentials.status("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_rejects_invalid_email() {
        let state = TestStateBuilder::new().build();
        state
            .credentials
            .issue("alice", CredentialKind::Code, json!({}))
            .await
            .unwrap();

        let result = purge_credentials(
            State(state.clone()),
            Path(PurgePath {
                email: "alice".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.credentials.status("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn status_rejects_invalid_email() {
        let state = TestStateBuilder::new().build();

        let result = credential_status(
            State(state),
            Query(StatusQuery {
                email: "not-an-email".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
