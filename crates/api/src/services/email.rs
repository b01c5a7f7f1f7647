//! Email sending abstraction.
//!
//! Uses Resend in production, SMTP (lettre) in development.
//! This allows local development without a Resend account.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, MultiPart},
};
use resend_rs::types::CreateEmailBaseOptions;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivers rendered messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Production sender, chosen from config.
pub enum EmailSenderImpl {
    /// SMTP-based sender using lettre (for development)
    Smtp(SmtpSender),
    /// Resend API sender (for production)
    Resend(ResendSender),
}

impl EmailSenderImpl {
    /// Uses Resend if an api key is provided, otherwise falls back to SMTP.
    pub fn new(
        resend_api_key: Option<String>,
        smtp_url: Option<String>,
        from: String,
    ) -> Result<Self> {
        if let Some(api_key) = resend_api_key.filter(|k| !k.is_empty()) {
            Ok(Self::Resend(ResendSender::new(api_key, from)))
        } else if let Some(url) = smtp_url.filter(|u| !u.is_empty()) {
            Ok(Self::Smtp(SmtpSender::new(url, from)?))
        } else {
            anyhow::bail!("Either RESEND_API_KEY or SMTP_URL must be configured")
        }
    }
}

#[async_trait]
impl EmailSender for EmailSenderImpl {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        match self {
            Self::Resend(sender) => sender.send(message).await,
            Self::Smtp(sender) => sender.send(message).await,
        }
    }
}

/// SMTP sender using lettre.
pub struct SmtpSender {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(smtp_url: String, from: String) -> Result<Self> {
        let transport = SmtpTransport::from_url(&smtp_url)?.build();

        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, message.to.parse()?))
            .subject(message.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))?;

        // lettre's SMTP transport blocks; keep it off the request workers.
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email)).await??;

        Ok(())
    }
}

/// Resend API sender.
pub struct ResendSender {
    client: resend_rs::Resend,
    from: String,
}

impl ResendSender {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: resend_rs::Resend::new(&api_key),
            from,
        }
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = CreateEmailBaseOptions::new(
            self.from.as_str(),
            [message.to.as_str()],
            message.subject.as_str(),
        )
        .with_text(&message.text)
        .with_html(&message.html);

        self.client.emails.send(email).await?;

        Ok(())
    }
}
