//! Email handler: compose from a template and send over the transport.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use switchboard_core::Capability;
use switchboard_services::{MailTransport, OutgoingMail, SmtpCredentials};

use crate::compose::{compose, ComposedEmail};
use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{ToolArgs, ToolOutput};

pub const MISSING_RECIPIENT: &str =
    "No recipient email address found. Please specify an email address in your request.";

/// Handler for composing and sending email.
pub struct EmailHandler {
    transport: Arc<dyn MailTransport>,
    credentials: Option<SmtpCredentials>,
    sender_name: String,
}

impl EmailHandler {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        credentials: Option<SmtpCredentials>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            sender_name: sender_name.into(),
        }
    }

    fn draft(to: &str, mail: &ComposedEmail) -> String {
        format!("To: {}\nSubject: {}\n\n{}", to, mail.subject, mail.body)
    }
}

#[async_trait]
impl ToolHandler for EmailHandler {
    fn capability(&self) -> Capability {
        Capability::Email
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Email(request) = args else {
            return Err(wrong_args(self.capability(), args));
        };
        let Some(to) = request.recipient.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(ToolOutput::text(MISSING_RECIPIENT));
        };

        let sender = self
            .credentials
            .as_ref()
            .map(|c| c.sender_name.as_str())
            .unwrap_or(&self.sender_name);
        let mail = compose(request, sender);

        let Some(credentials) = &self.credentials else {
            tracing::warn!(to = %to, "email credentials missing, returning draft");
            return Ok(ToolOutput::text(format!(
                "Email not sent: SMTP credentials are not configured. Here is the draft:\n\n{}",
                Self::draft(to, &mail)
            )));
        };

        let outgoing = OutgoingMail {
            to: to.to_string(),
            subject: mail.subject.clone(),
            body: mail.body,
        };
        self.transport.send(&outgoing, credentials).await?;
        info!(to = %to, kind = %request.kind, "email delivered");

        let mut text = format!(
            "{} sent successfully!\nTo: {}\nSubject: {}",
            request.kind.label(),
            to,
            mail.subject
        );
        if request.attachment_summary.is_some() {
            text.push_str("\nIncluded: document summary");
        }
        Ok(ToolOutput::text(text))
    }

    fn describe(&self, args: &ToolArgs) -> String {
        match args {
            ToolArgs::Email(req) => format!(
                "Send {} to {}",
                req.kind.label(),
                req.recipient.as_deref().unwrap_or("<no recipient>")
            ),
            _ => "Send email".to_string(),
        }
    }
}
