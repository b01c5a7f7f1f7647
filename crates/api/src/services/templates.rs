//! Subject/body rendering for credential notices.
//!
//! Bodies are handlebars templates rendered from the credential payload.
//! The display name comes from the payload's `name` field when one is
//! present. HTML bodies use the default escaping; plain-text bodies use
//! triple-stash so names come through verbatim.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde_json::{Value, json};

use super::email::EmailMessage;
use crate::credentials::{CredentialKind, Issued};

const CODE_TEXT: &str = "\
{{#if name}}Hi {{{name}}},{{else}}Hi,{{/if}}

Your verification code is: {{{key}}}

This code expires at {{{expires}}}.";

const CODE_HTML: &str = "\
<p>{{#if name}}Hi {{name}},{{else}}Hi,{{/if}}</p>\
<p>Your verification code is: <strong>{{key}}</strong></p>\
<p>This code expires at {{expires}}.</p>";

const LINK_TEXT: &str = "\
{{#if name}}Hi {{{name}}},{{else}}Hi,{{/if}}

Confirm your email address by opening this link:
{{{link}}}

The link expires at {{{expires}}}.";

const LINK_HTML: &str = "\
<p>{{#if name}}Hi {{name}},{{else}}Hi,{{/if}}</p>\
<p><a href=\"{{link}}\">Confirm your email address</a></p>\
<p>The link expires at {{expires}}.</p>";

const WELCOME_TEXT: &str = "\
{{#if name}}Hi {{{name}}},{{else}}Hi,{{/if}}

Your email address is confirmed. Welcome aboard.";

const WELCOME_HTML: &str = "\
<p>{{#if name}}Hi {{name}},{{else}}Hi,{{/if}}</p>\
<p>Your email address is confirmed. Welcome aboard.</p>";

/// Registered notice templates.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in [
            ("code_text", CODE_TEXT),
            ("code_html", CODE_HTML),
            ("link_text", LINK_TEXT),
            ("link_html", LINK_HTML),
            ("welcome_text", WELCOME_TEXT),
            ("welcome_html", WELCOME_HTML),
        ] {
            registry
                .register_template_string(name, source)
                .with_context(|| format!("invalid email template {}", name))?;
        }

        Ok(Self { registry })
    }

    /// Notice carrying a freshly issued (or resent) credential.
    pub fn verification_notice(
        &self,
        to: &str,
        kind: CredentialKind,
        issued: &Issued,
        public_url: &str,
    ) -> Result<EmailMessage> {
        let data = json!({
            "name": display_name(&issued.payload),
            "key": issued.key,
            "link": verification_link(public_url, &issued.key),
            "expires": format_expiry(issued.expires_at),
        });

        let (subject, template) = match kind {
            CredentialKind::Code => ("Your verification code", "code"),
            CredentialKind::Token => ("Confirm your email address", "link"),
        };

        self.message(to, subject, template, &data)
    }

    /// Notice sent once an address has been verified.
    pub fn welcome_notice(&self, to: &str, payload: &Value) -> Result<EmailMessage> {
        let data = json!({ "name": display_name(payload) });

        self.message(to, "Welcome!", "welcome", &data)
    }

    fn message(
        &self,
        to: &str,
        subject: &str,
        template: &str,
        data: &Value,
    ) -> Result<EmailMessage> {
        Ok(EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            text: self.render(&format!("{}_text", template), data)?,
            html: self.render(&format!("{}_html", template), data)?,
        })
    }

    fn render(&self, name: &str, data: &Value) -> Result<String> {
        self.registry
            .render(name, data)
            .with_context(|| format!("failed to render email template {}", name))
    }
}

/// `name` field of the payload, if it is a non-empty string.
pub fn display_name(payload: &Value) -> Option<&str> {
    payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
}

pub fn verification_link(public_url: &str, token: &str) -> String {
    format!("{}/verify?token={}", public_url.trim_end_matches('/'), token)
}

fn format_expiry(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
