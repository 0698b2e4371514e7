//! Email composition from an [`EmailRequest`].
//!
//! Each [`EmailKind`] has a template: subject line, greeting, a fixed body
//! around the user's content, and a sign-off. Templates are filled with the
//! extracted date/time phrase and, when present, a document summary.

use crate::types::{EmailKind, EmailRequest};

/// Subject and plain-text body ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub body: String,
}

/// "on {date} at {time}", "on {date}", "at {time}" or a neutral phrase.
pub fn describe_when(date: Option<&str>, time: Option<&str>) -> String {
    match (date, time) {
        (Some(d), Some(t)) => format!("on {} at {}", d, t),
        (Some(d), None) => format!("on {}", d),
        (None, Some(t)) => format!("at {}", t),
        (None, None) => "at your earliest convenience".to_string(),
    }
}

/// Capitalize and terminate a content fragment as a sentence.
fn as_sentence(content: &str) -> Option<String> {
    let trimmed = content.trim().trim_matches(|c: char| c == ',' || c == ';');
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut sentence: String = first.to_uppercase().chain(chars).collect();
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    Some(sentence)
}

fn subject_from_content(content: &str, sender: &str) -> String {
    let first = content
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty());
    match first {
        Some(s) if s.chars().count() <= 60 => as_sentence(s)
            .map(|s| s.trim_end_matches('.').to_string())
            .unwrap_or_else(|| s.to_string()),
        Some(s) => {
            let cut: String = s.chars().take(57).collect();
            format!("{}...", cut.trim_end())
        }
        None => format!("Message from {}", sender),
    }
}

struct Template {
    subject: String,
    greeting: &'static str,
    paragraphs: Vec<String>,
    closing: &'static str,
}

fn template(request: &EmailRequest, sender: &str) -> Template {
    let when = describe_when(request.date.as_deref(), request.time.as_deref());
    let scheduled = request.date.is_some() || request.time.is_some();
    let content = as_sentence(&request.content);

    match request.kind {
        EmailKind::BirthdayInvitation => {
            let mut paragraphs = vec![format!(
                "I'm celebrating my birthday and would love for you to join me {}.",
                when
            )];
            paragraphs.extend(content);
            paragraphs.push(
                "It wouldn't be the same without you. Please let me know if you can make it!"
                    .to_string(),
            );
            Template {
                subject: "You're Invited to My Birthday Celebration!".to_string(),
                greeting: "Hi,",
                paragraphs,
                closing: "Best wishes,",
            }
        }
        EmailKind::ProfessionalMeeting => {
            let mut paragraphs = vec![format!(
                "I hope this message finds you well. I would like to request a meeting {}.",
                when
            )];
            if let Some(c) = content {
                paragraphs.push(format!("The purpose of the meeting: {}", c));
            }
            paragraphs.push(
                "Please let me know if this works for you, or suggest a time that better suits your schedule."
                    .to_string(),
            );
            paragraphs.push("Thank you for your time and consideration.".to_string());
            let subject = match &request.date {
                Some(d) => format!("Meeting Request - {}", d),
                None => "Meeting Request".to_string(),
            };
            Template {
                subject,
                greeting: "Dear Sir/Madam,",
                paragraphs,
                closing: "Best regards,",
            }
        }
        EmailKind::ThankYou => {
            let mut paragraphs = vec!["I wanted to take a moment to say thank you.".to_string()];
            paragraphs.extend(content);
            paragraphs.push("Your help and support are truly appreciated.".to_string());
            Template {
                subject: "Thank You!".to_string(),
                greeting: "Hi,",
                paragraphs,
                closing: "Warm regards,",
            }
        }
        EmailKind::Complaint => {
            let mut paragraphs =
                vec!["I am writing to raise a concern regarding the following matter.".to_string()];
            paragraphs.extend(content);
            paragraphs.push(
                "I would appreciate it if this could be looked into and resolved promptly. Please let me know the next steps."
                    .to_string(),
            );
            Template {
                subject: "Formal Complaint".to_string(),
                greeting: "Dear Sir/Madam,",
                paragraphs,
                closing: "Sincerely,",
            }
        }
        EmailKind::JobApplication => {
            let mut paragraphs = vec![
                "I am writing to express my interest in a position with your organization."
                    .to_string(),
            ];
            paragraphs.extend(content);
            let availability = if scheduled {
                format!("I am available for an interview {}.", when)
            } else {
                "I would welcome the opportunity to discuss how my skills and experience can contribute to your team.".to_string()
            };
            paragraphs.push(availability);
            paragraphs.push("Thank you for considering my application.".to_string());
            Template {
                subject: "Job Application".to_string(),
                greeting: "Dear Hiring Manager,",
                paragraphs,
                closing: "Sincerely,",
            }
        }
        EmailKind::Casual => {
            let mut paragraphs = vec!["Hope you're doing well!".to_string()];
            paragraphs.extend(content);
            if scheduled {
                paragraphs.push(format!("Let's catch up {}.", when));
            }
            Template {
                subject: "Hey there!".to_string(),
                greeting: "Hey,",
                paragraphs,
                closing: "Talk soon,",
            }
        }
        EmailKind::General => {
            let subject = subject_from_content(&request.content, sender);
            let mut paragraphs: Vec<String> = content.into_iter().collect();
            if scheduled {
                paragraphs.push(format!("This is regarding {}.", when));
            }
            if paragraphs.is_empty() {
                paragraphs.push("I hope this message finds you well.".to_string());
            }
            Template {
                subject,
                greeting: "Hello,",
                paragraphs,
                closing: "Best regards,",
            }
        }
    }
}

/// Build the subject and body for a request, signed by `sender`.
pub fn compose(request: &EmailRequest, sender: &str) -> ComposedEmail {
    let Template {
        subject,
        greeting,
        mut paragraphs,
        closing,
    } = template(request, sender);

    if let Some(summary) = request
        .attachment_summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        paragraphs.push(format!("Document summary:\n{}", summary));
    }

    let body = format!(
        "{}\n\n{}\n\n{}\n{}",
        greeting,
        paragraphs.join("\n\n"),
        closing,
        sender
    );
    ComposedEmail { subject, body }
}
