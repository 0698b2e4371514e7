//! Turn pipeline.
//!
//! One call to [`ChatEngine::handle_turn`] per user message:
//!
//! - document attached: PDF analysis, plus an email when the text asks for one
//! - image attached: description, or OCR when the text asks to read text
//! - text only: classify, extract, dispatch
//! - nothing: greeting
//!
//! Every path ends with exactly one memory record and one reply.

use serde::Serialize;
use tracing::{debug, info};

use switchboard_core::{
    Attachment, AttachmentKind, Capability, Message, SwitchboardConfig, SwitchboardError, TurnTag,
};
use switchboard_tools::{DocumentInput, FallbackNotice, ImageMode, ToolArgs, ToolRegistry};

use crate::classifier::IntentClassifier;
use crate::dispatcher::{DispatchOutcome, ToolDispatcher};
use crate::error::ChatError;
use crate::extractor::ParameterExtractor;
use crate::response::{
    self, combine_pdf_and_email, contextual_response, IMAGE_UPLOAD_PLACEHOLDER,
    PDF_UPLOAD_PLACEHOLDER,
};
use crate::session::{AttachmentSlot, ChatSession};

/// Words that make an email request pick up the stored document summary.
const DOCUMENT_REFERENCES: &[&str] = &["pdf", "document", "summary", "attachment", "file", "report"];

/// What the user sees for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub text: String,
    pub tag: TurnTag,
    /// Set when a tool answered through a degraded path.
    pub fallback: Option<FallbackNotice>,
}

impl TurnReply {
    fn new(text: impl Into<String>, tag: TurnTag) -> Self {
        Self {
            text: text.into(),
            tag,
            fallback: None,
        }
    }

    fn failed(outcome: DispatchOutcome) -> Self {
        Self::new(outcome.text, TurnTag::Error)
    }
}

/// Stateless turn handler, shared by every session.
#[derive(Clone)]
pub struct ChatEngine {
    classifier: IntentClassifier,
    extractor: ParameterExtractor,
    dispatcher: ToolDispatcher,
    max_attachment_bytes: usize,
}

impl ChatEngine {
    pub fn new(registry: ToolRegistry, config: &SwitchboardConfig) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            extractor: ParameterExtractor::from_config(config),
            dispatcher: ToolDispatcher::new(registry, config.dispatch.clone()),
            max_attachment_bytes: config.documents.max_bytes,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Wrap raw file bytes as an attachment, enforcing the size limit.
    pub fn attachment(&self, kind: AttachmentKind, bytes: Vec<u8>) -> Result<Attachment, ChatError> {
        if bytes.is_empty() {
            return Err(SwitchboardError::InvalidAttachment("attachment is empty".to_string()).into());
        }
        if bytes.len() > self.max_attachment_bytes {
            return Err(SwitchboardError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_attachment_bytes,
            }
            .into());
        }
        Ok(match kind {
            AttachmentKind::Image => Attachment::Image(bytes),
            AttachmentKind::Document => Attachment::Document(bytes),
        })
    }

    /// Decode a base64 or `data:` URL payload, enforcing the size limit.
    pub fn decode_attachment(&self, kind: AttachmentKind, encoded: &str) -> Result<Attachment, ChatError> {
        let decoded = Attachment::from_encoded(kind, encoded)?;
        let bytes = match decoded {
            Attachment::Image(b) | Attachment::Document(b) => b,
        };
        self.attachment(kind, bytes)
    }

    /// Handle one user message. Never fails; errors come back as text
    /// tagged [`TurnTag::Error`].
    pub async fn handle_turn(&self, session: &mut ChatSession, message: Message) -> TurnReply {
        let Message { text, attachment } = message;
        let (user_text, reply) = match attachment {
            Some(Attachment::Document(bytes)) => (
                upload_user_text(&text, PDF_UPLOAD_PLACEHOLDER, "PDF"),
                self.document_turn(session, &text, bytes).await,
            ),
            Some(Attachment::Image(bytes)) => (
                upload_user_text(&text, IMAGE_UPLOAD_PLACEHOLDER, "Image"),
                self.image_turn(session, &text, bytes).await,
            ),
            None if text.trim().is_empty() => (String::new(), self.greeting(session)),
            None => (text.trim().to_string(), self.text_turn(session, &text).await),
        };

        session
            .memory_mut()
            .add_interaction(&user_text, &reply.text, Some(reply.tag));
        info!(
            session = %session.key(),
            tag = %reply.tag,
            fallback = reply.fallback.is_some(),
            "turn complete"
        );
        reply
    }

    fn greeting(&self, session: &ChatSession) -> TurnReply {
        TurnReply::new(response::greeting(!session.memory().is_empty()), TurnTag::Greeting)
    }

    async fn document_turn(&self, session: &mut ChatSession, text: &str, bytes: Vec<u8>) -> TurnReply {
        let wants_email = self.classifier.classify(text) == Some(Capability::Email);
        let analysis = self
            .dispatcher
            .dispatch(ToolArgs::Document {
                input: DocumentInput::Upload(bytes),
                prompt: text.trim().to_string(),
            })
            .await;

        session.set_slot(match &analysis.digest {
            Some(digest) => AttachmentSlot::Document {
                text: digest.text.clone(),
                summary: digest.summary.clone(),
                pages: digest.page_count,
            },
            None => AttachmentSlot::Empty,
        });
        if !analysis.succeeded {
            return TurnReply::failed(analysis);
        }
        if !wants_email {
            return TurnReply {
                text: analysis.text,
                tag: TurnTag::Capability(Capability::PdfAnalysis),
                fallback: analysis.fallback,
            };
        }

        let mut request = self.extractor.email_request(text);
        request.attachment_summary = document_summary(session.slot());
        let email = self.dispatcher.dispatch(ToolArgs::Email(request)).await;
        TurnReply {
            text: combine_pdf_and_email(&analysis.text, &email.text),
            tag: TurnTag::PdfEmail,
            fallback: analysis.fallback,
        }
    }

    async fn image_turn(&self, session: &mut ChatSession, text: &str, bytes: Vec<u8>) -> TurnReply {
        let mode = if self.classifier.classify(text) == Some(Capability::Ocr) {
            ImageMode::ReadText
        } else {
            ImageMode::Describe
        };
        session.set_slot(AttachmentSlot::Image {
            bytes: bytes.clone(),
        });

        let outcome = self
            .dispatcher
            .dispatch(ToolArgs::Image {
                image: Some(bytes),
                prompt: text.trim().to_string(),
                mode,
            })
            .await;
        if !outcome.succeeded {
            return TurnReply::failed(outcome);
        }
        let tag = match mode {
            ImageMode::ReadText => TurnTag::Capability(Capability::Ocr),
            ImageMode::Describe => TurnTag::ImageAnalysis,
        };
        TurnReply {
            text: outcome.text,
            tag,
            fallback: outcome.fallback,
        }
    }

    async fn text_turn(&self, session: &ChatSession, text: &str) -> TurnReply {
        let capability = match self.classifier.classify_with_trace(text) {
            Some(hit) => {
                debug!(capability = %hit.capability, rule = hit.rule, "classified");
                hit.capability
            }
            None => Capability::Conversation,
        };

        let mut args = self.extractor.extract(capability, text);
        self.attach_session_state(&mut args, session, text);

        let outcome = self.dispatcher.dispatch(args).await;
        if !outcome.succeeded {
            return TurnReply::failed(outcome);
        }
        TurnReply {
            text: contextual_response(capability, &outcome.text),
            tag: TurnTag::Capability(capability),
            fallback: outcome.fallback,
        }
    }

    /// Fill the parts of `args` that live in the session rather than the text.
    fn attach_session_state(&self, args: &mut ToolArgs, session: &ChatSession, text: &str) {
        match (args, session.slot()) {
            (ToolArgs::Document { input, .. }, AttachmentSlot::Document { text, pages, .. }) => {
                *input = DocumentInput::Extracted {
                    text: text.clone(),
                    page_count: *pages,
                };
            }
            (ToolArgs::Image { image, .. }, AttachmentSlot::Image { bytes }) => {
                *image = Some(bytes.clone());
            }
            (ToolArgs::Email(request), slot) => {
                let lower = text.to_lowercase();
                if DOCUMENT_REFERENCES.iter().any(|w| lower.contains(w)) {
                    request.attachment_summary = document_summary(slot);
                }
            }
            (
                ToolArgs::Conversation {
                    context, follow_up, ..
                },
                _,
            ) => {
                let memory = session.memory();
                if !memory.is_empty() {
                    *context = memory.get_context();
                }
                *follow_up = memory.is_follow_up(text);
            }
            _ => {}
        }
    }
}

fn upload_user_text(text: &str, placeholder: &str, kind: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        placeholder.to_string()
    } else {
        format!("{} ({})", text, kind)
    }
}

fn document_summary(slot: &AttachmentSlot) -> Option<String> {
    match slot {
        AttachmentSlot::Document { summary, .. } if !summary.trim().is_empty() => Some(summary.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use switchboard_core::config::MemoryConfig;
    use switchboard_llm::MockCompletionService;
    use switchboard_ocr::MockOcrService;
    use switchboard_services::{
        MockDocumentExtractor, MockMailTransport, MockNewsService, MockWeatherService,
    };
    use switchboard_tools::ToolServices;

    const PDF_TEXT: &str = "Project Phoenix status report. The migration to the new platform finished two weeks early. Remaining work covers monitoring and documentation.";

    fn engine_with(documents: MockDocumentExtractor, config: &SwitchboardConfig) -> ChatEngine {
        let services = ToolServices {
            completion: Arc::new(MockCompletionService::new()),
            ocr: Arc::new(MockOcrService::with_text("INVOICE 42")),
            weather: Arc::new(MockWeatherService::new()),
            news: Arc::new(MockNewsService::new()),
            mail: Arc::new(MockMailTransport::new()),
            documents: Arc::new(documents),
        };
        ChatEngine::new(ToolRegistry::with_defaults(services, config), config)
    }

    fn engine() -> ChatEngine {
        engine_with(
            MockDocumentExtractor::with_text(PDF_TEXT, 2),
            &SwitchboardConfig::default(),
        )
    }

    fn session() -> ChatSession {
        ChatSession::new("test", &MemoryConfig::default())
    }

    // =========================================================================
    // Greeting
    // =========================================================================

    #[tokio::test]
    async fn test_empty_message_greets() {
        let engine = engine();
        let mut session = session();
        let reply = engine.handle_turn(&mut session, Message::text("")).await;
        assert_eq!(reply.tag, TurnTag::Greeting);
        assert!(reply.text.starts_with("Hello!"));
        assert_eq!(session.memory().len(), 1);

        let again = engine.handle_turn(&mut session, Message::text("  ")).await;
        assert_ne!(again.text, reply.text);
    }

    // =========================================================================
    // Text turns
    // =========================================================================

    #[tokio::test]
    async fn test_text_turn_gets_banner() {
        let mut session = session();
        let reply = engine()
            .handle_turn(&mut session, Message::text("calculate 15 * 20"))
            .await;
        assert_eq!(reply.tag, TurnTag::Capability(Capability::Calculator));
        assert!(reply.text.starts_with("Calculation Result\n\n"));
        assert!(reply.text.contains("300"));
    }

    #[tokio::test]
    async fn test_unit_conversion_with_in_and_into() {
        let engine = engine();
        let mut session = session();
        for (text, expected) in [
            ("5 kg into pounds", "5 kg = 11.02 pounds"),
            ("100 km in miles", "100 km = 62.14 miles"),
            ("30 celsius in fahrenheit", "30 celsius = 86.00 fahrenheit"),
        ] {
            let reply = engine.handle_turn(&mut session, Message::text(text)).await;
            assert_eq!(reply.tag, TurnTag::Capability(Capability::UnitConverter), "{}", text);
            assert_eq!(reply.text, format!("Unit Conversion\n\n{}", expected));
        }
    }

    #[tokio::test]
    async fn test_reply_serializes_tag_as_string() {
        let mut session = session();
        let reply = engine()
            .handle_turn(&mut session, Message::text("10 km to miles"))
            .await;
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["tag"], "unit_converter");
        assert!(json["fallback"].is_null());
    }

    #[tokio::test]
    async fn test_failed_turn_is_tagged_error() {
        let mut session = session();
        let reply = engine()
            .handle_turn(&mut session, Message::text("calculate 4 / 0"))
            .await;
        assert_eq!(reply.tag, TurnTag::Error);
        assert_eq!(reply.text, "Calculator error: Division by zero");
        assert_eq!(session.memory().last().unwrap().tag, Some(TurnTag::Error));
    }

    #[tokio::test]
    async fn test_conversation_receives_context() {
        let mut session = session();
        session
            .memory_mut()
            .add_interaction("What is AI?", "AI is the study of intelligent agents.", None);
        let mut args = ToolArgs::Conversation {
            message: "Where is it used?".into(),
            context: String::new(),
            follow_up: false,
            code_request: false,
        };
        engine().attach_session_state(&mut args, &session, "Where is it used?");
        let ToolArgs::Conversation {
            context, follow_up, ..
        } = args
        else {
            panic!("expected conversation args");
        };
        assert!(follow_up);
        assert!(context.contains("User: What is AI?"));
    }

    // =========================================================================
    // Attachments
    // =========================================================================

    #[tokio::test]
    async fn test_pdf_upload_fills_slot() {
        let mut session = session();
        let reply = engine()
            .handle_turn(
                &mut session,
                Message::with_attachment("", Attachment::Document(vec![1, 2, 3])),
            )
            .await;
        assert_eq!(reply.tag, TurnTag::Capability(Capability::PdfAnalysis));
        assert!(matches!(session.slot(), AttachmentSlot::Document { pages: 2, .. }));
        assert_eq!(session.memory().last().unwrap().user_text, PDF_UPLOAD_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_pdf_follow_up_reuses_slot() {
        let engine = engine();
        let mut session = session();
        engine
            .handle_turn(
                &mut session,
                Message::with_attachment("", Attachment::Document(vec![1])),
            )
            .await;
        let reply = engine
            .handle_turn(&mut session, Message::text("summarize the pdf again"))
            .await;
        assert_eq!(reply.tag, TurnTag::Capability(Capability::PdfAnalysis));
        assert!(reply.text.contains("Pages: 2"));
    }

    #[tokio::test]
    async fn test_image_modes() {
        let engine = engine();
        let mut session = session();
        let describe = engine
            .handle_turn(
                &mut session,
                Message::with_attachment("what is this?", Attachment::Image(vec![9; 8])),
            )
            .await;
        assert_eq!(describe.tag, TurnTag::ImageAnalysis);
        assert_eq!(session.memory().last().unwrap().user_text, "what is this? (Image)");

        let read = engine
            .handle_turn(
                &mut session,
                Message::with_attachment("read the text", Attachment::Image(vec![9; 8])),
            )
            .await;
        assert_eq!(read.tag, TurnTag::Capability(Capability::Ocr));
        assert!(read.text.contains("INVOICE 42"));
    }

    #[tokio::test]
    async fn test_ocr_text_turn_uses_last_image() {
        let engine = engine();
        let mut session = session();
        session.set_slot(AttachmentSlot::Image { bytes: vec![1, 2] });
        let reply = engine
            .handle_turn(&mut session, Message::text("extract text from the image"))
            .await;
        assert_eq!(reply.tag, TurnTag::Capability(Capability::Ocr));
        assert!(reply.text.contains("INVOICE 42"));
    }

    // =========================================================================
    // Attachment intake
    // =========================================================================

    #[test]
    fn test_attachment_size_limit() {
        let mut config = SwitchboardConfig::default();
        config.documents.max_bytes = 4;
        let engine = engine_with(MockDocumentExtractor::with_text(PDF_TEXT, 1), &config);
        assert!(engine.attachment(AttachmentKind::Image, vec![0; 4]).is_ok());
        let err = engine.attachment(AttachmentKind::Image, vec![0; 5]).unwrap_err();
        assert_eq!(err.to_string(), "Payload too large: 5 bytes exceeds 4 bytes");
        assert!(engine.attachment(AttachmentKind::Document, Vec::new()).is_err());
    }

    #[test]
    fn test_decode_attachment() {
        let attachment = engine()
            .decode_attachment(AttachmentKind::Document, "data:application/pdf;base64,JVBERg==")
            .unwrap();
        assert_eq!(attachment, Attachment::Document(b"%PDF".to_vec()));
        assert!(engine().decode_attachment(AttachmentKind::Image, "***").is_err());
    }
}
