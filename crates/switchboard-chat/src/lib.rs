//! Conversation engine for Switchboard.
//!
//! Routes each message through an ordered intent classifier, extracts typed
//! tool arguments, dispatches to the registered tool under a deadline, and
//! records the turn in bounded per-session memory.

pub mod classifier;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod memory;
pub mod response;
pub mod session;
pub mod topics;

pub use classifier::{Classification, IntentClassifier};
pub use dispatcher::{DispatchOutcome, ToolDispatcher};
pub use engine::{ChatEngine, TurnReply};
pub use error::ChatError;
pub use extractor::ParameterExtractor;
pub use memory::{ConversationMemory, Interaction, NO_HISTORY};
pub use session::{AttachmentSlot, ChatSession, SessionStore};
pub use topics::{TopicExtractor, TopicSet};
