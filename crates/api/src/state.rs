use std::sync::Arc;

use crate::{
    config::Config,
    credentials::CredentialService,
    services::{EmailSender, templates::Templates},
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Credential issuance and verification.
    pub credentials: Arc<CredentialService>,
    /// Email sender.
    pub email: Arc<dyn EmailSender>,
    /// Notice templates.
    pub templates: Arc<Templates>,
}
