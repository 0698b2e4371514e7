//! Switchboard binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Wire the real collaborators (or mocks with `--offline`) into a tool registry
//! 4. Run an interactive loop over stdin, one chat turn per line

mod cli;
mod repl;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use switchboard_chat::{ChatEngine, ChatSession, SessionStore, TurnReply};
use switchboard_core::{Message, SwitchboardConfig};
use switchboard_llm::{MockCompletionService, OllamaClient};
use switchboard_ocr::{MockOcrService, TesseractOcrService};
use switchboard_services::{
    LopdfExtractor, MockDocumentExtractor, MockMailTransport, MockNewsService, MockWeatherService,
    NewsApiClient, SmtpMailer, WeatherApiClient,
};
use switchboard_tools::{ToolRegistry, ToolServices};

use cli::CliArgs;
use repl::Command;

/// Collaborators that talk to the outside world.
fn live_services(config: &SwitchboardConfig) -> Result<ToolServices, Box<dyn std::error::Error>> {
    Ok(ToolServices {
        completion: Arc::new(OllamaClient::new(config.llm.clone())?),
        ocr: Arc::new(TesseractOcrService::new(config.ocr.clone())),
        weather: Arc::new(WeatherApiClient::new(config.weather.clone())?),
        news: Arc::new(NewsApiClient::new(config.news.clone())?),
        mail: Arc::new(SmtpMailer::new(&config.email)),
        documents: Arc::new(LopdfExtractor::new(config.documents.max_bytes)),
    })
}

fn offline_services() -> ToolServices {
    ToolServices {
        completion: Arc::new(MockCompletionService::new()),
        ocr: Arc::new(MockOcrService::new()),
        weather: Arc::new(MockWeatherService::new()),
        news: Arc::new(MockNewsService::new()),
        mail: Arc::new(MockMailTransport::new()),
        documents: Arc::new(MockDocumentExtractor::default()),
    }
}

fn print_reply(reply: &TurnReply) {
    println!("\n{}\n", reply.text);
    if let Some(notice) = &reply.fallback {
        tracing::debug!(kind = ?notice.kind, reason = %notice.reason, "reply used a fallback");
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run one parsed command. Returns `false` when the loop should stop.
async fn run_command(engine: &ChatEngine, session: &mut ChatSession, command: Command) -> bool {
    match command {
        Command::Chat(text) => {
            let reply = engine.handle_turn(session, Message::text(text)).await;
            print_reply(&reply);
        }
        Command::Upload { kind, path, text } => {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read upload");
                    println!("Could not read {}: {}", path.display(), e);
                    return true;
                }
            };
            match engine.attachment(kind, bytes) {
                Ok(attachment) => {
                    let reply = engine
                        .handle_turn(session, Message::with_attachment(text, attachment))
                        .await;
                    print_reply(&reply);
                }
                Err(e) => println!("{}", e),
            }
        }
        Command::Summary => println!("\n{}\n", session.summary()),
        Command::History => println!("\n{}\n", repl::render_history(&session.history())),
        Command::Clear => {
            session.clear_memory();
            println!("Conversation cleared.");
        }
        Command::Help => println!("{}", repl::HELP),
        Command::Invalid(message) => println!("{}", message),
        Command::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = SwitchboardConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    // Tracing. RUST_LOG wins over the CLI and config levels.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Switchboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let services = if args.offline {
        tracing::info!("Offline mode: using mock collaborators");
        offline_services()
    } else {
        live_services(&config)?
    };
    let registry = ToolRegistry::with_defaults(services, &config);
    tracing::info!(capabilities = registry.capabilities().len(), "Tool registry ready");
    let engine = ChatEngine::new(registry, &config);

    let store = SessionStore::new(config.memory.clone());
    let session = store.get_or_create(&args.session_key())?;

    println!("{}\n", repl::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let mut guard = session.lock().await;
        if !run_command(&engine, &mut guard, repl::parse(&line)).await {
            break;
        }
        drop(guard);
        prompt();
    }

    tracing::info!("Switchboard stopped");
    Ok(())
}
