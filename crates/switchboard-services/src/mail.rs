//! Outgoing email over SMTP (STARTTLS) via `lettre`.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use switchboard_core::config::EmailConfig;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A composed, ready-to-send plain-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Login for the SMTP relay. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
    pub sender_name: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

impl SmtpCredentials {
    /// Credentials from config, if both username and password are set.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let username = config.username.clone().filter(|u| !u.is_empty())?;
        let password = config.password.clone().filter(|p| !p.is_empty())?;
        Some(Self {
            username,
            password,
            sender_name: config.sender_name.clone(),
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("Email credentials not configured")]
    MissingCredentials,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail, credentials: &SmtpCredentials)
        -> Result<(), MailError>;
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, MailError> {
    let addr = address
        .trim()
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), addr))
}

/// Build the MIME message. Split out so it can be tested without a relay.
pub fn build_message(mail: &OutgoingMail, credentials: &SmtpCredentials) -> Result<Message, MailError> {
    let from = mailbox(Some(&credentials.sender_name), &credentials.username)?;
    let to = mailbox(None, &mail.to)?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

/// SMTP relay client.
pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        mail: &OutgoingMail,
        credentials: &SmtpCredentials,
    ) -> Result<(), MailError> {
        let message = build_message(mail, credentials)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!(to = %mail.to, subject = %mail.subject, "email sent");
        Ok(())
    }
}

/// Transport that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockMailTransport {
    failure: Option<MailError>,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: MailError) -> Self {
        Self {
            failure: Some(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(
        &self,
        mail: &OutgoingMail,
        credentials: &SmtpCredentials,
    ) -> Result<(), MailError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        build_message(mail, credentials)?;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }
}
