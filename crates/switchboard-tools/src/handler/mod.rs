//! Tool handler registry and trait definition.
//!
//! Defines the `ToolHandler` async trait and the registry the dispatcher
//! uses to find the handler for a capability.

pub mod calculator;
pub mod clock;
pub mod conversation;
pub mod document;
pub mod email;
pub mod image;
pub mod news;
pub mod units;
pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use switchboard_core::{Capability, SwitchboardConfig};
use switchboard_llm::{CompletionOptions, CompletionService};
use switchboard_ocr::OcrService;
use switchboard_services::{
    DocumentExtractor, MailTransport, NewsService, SmtpCredentials, WeatherService,
};

use crate::error::ToolError;
use crate::types::{ToolArgs, ToolOutput};

/// One capability's implementation.
///
/// Handlers return `Ok` for anything the user can act on (missing upload,
/// missing recipient, unsupported unit) and `Err` for genuine failures.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn capability(&self) -> Capability;

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError>;

    /// Short log line for a call.
    fn describe(&self, args: &ToolArgs) -> String {
        format!("{} ({})", self.capability().label(), args.kind())
    }
}

pub(crate) fn wrong_args(capability: Capability, args: &ToolArgs) -> ToolError {
    ToolError::WrongArgs {
        capability,
        got: args.kind(),
    }
}

/// External collaborators the default handlers are built from.
#[derive(Clone)]
pub struct ToolServices {
    pub completion: Arc<dyn CompletionService>,
    pub ocr: Arc<dyn OcrService>,
    pub weather: Arc<dyn WeatherService>,
    pub news: Arc<dyn NewsService>,
    pub mail: Arc<dyn MailTransport>,
    pub documents: Arc<dyn DocumentExtractor>,
}

/// Capability to handler map.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    handlers: HashMap<Capability, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one handler per capability, wired from config.
    pub fn with_defaults(services: ToolServices, config: &SwitchboardConfig) -> Self {
        let text_options = CompletionOptions::text(&config.llm);
        let vision_options = CompletionOptions::vision(&config.llm);

        let mut registry = Self::new();
        registry.register(Arc::new(calculator::CalculatorHandler));
        registry.register(Arc::new(clock::ClockHandler));
        registry.register(Arc::new(units::UnitConverterHandler));
        registry.register(Arc::new(weather::WeatherHandler::new(services.weather)));
        registry.register(Arc::new(news::NewsHandler::new(services.news)));
        registry.register(Arc::new(email::EmailHandler::new(
            services.mail,
            SmtpCredentials::from_config(&config.email),
            config.email.sender_name.clone(),
        )));
        registry.register(Arc::new(document::DocumentHandler::new(
            services.documents,
            services.completion.clone(),
            text_options.clone(),
            config.documents.summary_chars,
            config.documents.prompt_chars,
        )));
        registry.register(Arc::new(image::ImageHandler::new(
            services.completion.clone(),
            services.ocr,
            vision_options,
            config.ocr.language.clone(),
        )));
        registry.register(Arc::new(conversation::ConversationHandler::new(
            services.completion,
            text_options,
        )));
        registry
    }

    /// Register a handler, replacing any previous one for its capability.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.capability(), handler);
    }

    pub fn get(&self, capability: Capability) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(&capability).cloned()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        let mut caps: Vec<_> = self.handlers.keys().copied().collect();
        caps.sort();
        caps
    }
}
