// Transactional mail API client

use crate::auth::TokenFingerprint;
use crate::core::errors::{EmailError, IdentityError};
use crate::email::EmailDispatcher;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

const SUBJECT: &str = "Verify your email address";

#[derive(Debug, Serialize)]
struct Mailbox<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Mailbox<'a>,
    to: Vec<Mailbox<'a>>,
    subject: &'a str,
    html_content: String,
    text_content: String,
}

/// Posts verification emails as JSON to a mail provider
///
/// The request body follows the Brevo `smtp/email` shape; the API key goes
/// in the `api-key` header.
pub struct HttpEmailDispatcher {
    http_client: Client,
    api_url: String,
    api_key: Secret<String>,
    sender: String,
    verification_base_url: String,
}

impl HttpEmailDispatcher {
    pub fn new(
        api_url: &str,
        api_key: Secret<String>,
        sender: &str,
        verification_base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, IdentityError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| IdentityError::Configuration(format!(
                "Failed to create email HTTP client: {}", e
            )))?;

        Ok(Self {
            http_client,
            api_url: api_url.to_string(),
            api_key,
            sender: sender.to_string(),
            verification_base_url: verification_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Link the recipient follows to submit `token`
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/{}", self.verification_base_url, token)
    }

    fn request_body<'a>(&'a self, to_email: &'a str, link: &str) -> SendRequest<'a> {
        SendRequest {
            sender: Mailbox { email: &self.sender },
            to: vec![Mailbox { email: to_email }],
            subject: SUBJECT,
            html_content: format!(
                "<p>Confirm your email address by following <a href=\"{link}\">this link</a>.</p>\
                 <p>The link expires in 24 hours.</p>"
            ),
            text_content: format!(
                "Confirm your email address by opening {link}\nThe link expires in 24 hours."
            ),
        }
    }
}

#[async_trait]
impl EmailDispatcher for HttpEmailDispatcher {
    async fn send(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        let link = self.verification_link(token);
        let body = self.request_body(to_email, &link);

        let response = self
            .http_client
            .post(&self.api_url)
            .header("api-key", self.api_key.expose_secret())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmailError::Transport("request timed out".to_string())
                } else {
                    EmailError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, to = %to_email, "Mail provider rejected verification email");
            return Err(EmailError::Rejected { status: status.as_u16() });
        }

        info!(
            to = %to_email,
            token_fingerprint = %TokenFingerprint::of(token),
            "Verification email sent"
        );
        Ok(())
    }
}
