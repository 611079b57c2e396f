use axum::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Delivery failures the lifecycle handlers need to tell apart.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

/// Which email to render; template props are carried inline.
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    VerificationCode { code: String },
    PasswordReset { reset_url: String },
}

impl EmailTemplate {
    fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::VerificationCode { .. } => "Verify your email",
            EmailTemplate::PasswordReset { .. } => "Reset your password",
        }
    }

    fn html(&self) -> String {
        match self {
            EmailTemplate::VerificationCode { code } => format!(
                "<p>Use this code to verify your email address:</p>\
                 <p><strong>{code}</strong></p>\
                 <p>The code expires in a few minutes.</p>"
            ),
            EmailTemplate::PasswordReset { reset_url } => format!(
                "<p>We received a request to reset your password.</p>\
                 <p><a href=\"{reset_url}\">Reset your password</a></p>\
                 <p>If this wasn't you, you can ignore this email.</p>"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError>;
}

/// Delivery via the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
}

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

impl ResendMailer {
    pub fn new(api_key: &str, from: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    name: Option<String>,
    message: Option<String>,
}

fn classify_error(body: &str) -> MailError {
    match serde_json::from_str::<ResendErrorBody>(body) {
        Ok(parsed) if parsed.name.as_deref() == Some("not_found") => MailError::RecipientNotFound,
        Ok(parsed) => MailError::Delivery(
            parsed
                .message
                .unwrap_or_else(|| "unrecognized provider error".into()),
        ),
        Err(_) => MailError::Delivery(body.to_string()),
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError> {
        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": template.subject(),
                "html": template.html(),
            }))
            .send()
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            debug!(recipient = %to, "email sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(&body))
    }
}

/// Swallows every send. Used by `AppState::fake`.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _to: &str, _template: EmailTemplate) -> Result<(), MailError> {
        Ok(())
    }
}
