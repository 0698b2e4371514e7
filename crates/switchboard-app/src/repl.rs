//! Parsing and rendering for the interactive terminal loop.

use std::path::PathBuf;

use switchboard_chat::Interaction;
use switchboard_core::AttachmentKind;

pub const HELP: &str = "Type a message, or one of:
  /image <path> [text]   analyse an image (add \"read the text\" for OCR)
  /pdf <path> [text]     analyse a PDF (add \"email it to ...\" to send the summary)
  /summary               conversation summary
  /history               stored exchanges
  /clear                 forget the conversation
  /quit                  exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat(String),
    Upload {
        kind: AttachmentKind,
        path: PathBuf,
        text: String,
    },
    Summary,
    History,
    Clear,
    Help,
    Quit,
    /// A slash command that is unknown or missing its argument.
    Invalid(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Chat(line.to_string());
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "image" => upload(AttachmentKind::Image, name, args),
        "pdf" => upload(AttachmentKind::Document, name, args),
        "summary" => Command::Summary,
        "history" => Command::History,
        "clear" => Command::Clear,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: /{}", name)),
    }
}

fn upload(kind: AttachmentKind, name: &str, args: &str) -> Command {
    let (path, text) = match args.split_once(char::is_whitespace) {
        Some((path, text)) => (path, text.trim()),
        None => (args, ""),
    };
    if path.is_empty() {
        return Command::Invalid(format!("Usage: /{} <path> [text]", name));
    }
    Command::Upload {
        kind,
        path: PathBuf::from(path),
        text: text.to_string(),
    }
}

/// Render stored exchanges, oldest first.
pub fn render_history(records: &[Interaction]) -> String {
    if records.is_empty() {
        return "No exchanges stored yet.".to_string();
    }
    records
        .iter()
        .map(|r| {
            let tag = r.tag.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
            let first_line = r.response_text.lines().next().unwrap_or_default();
            format!("#{} [{}] {}\n    {}", r.seq, tag, r.user_text, first_line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
