//! Capability handlers for Switchboard.
//!
//! One [`ToolHandler`] per capability, collected in a [`ToolRegistry`]. Each
//! handler takes typed [`ToolArgs`], talks to its collaborator, and returns a
//! [`ToolOutput`] or a [`ToolError`]. Turning errors into user-facing text is
//! the dispatcher's job, not the handlers'.

pub mod analysis;
pub mod compose;
pub mod error;
pub mod handler;
pub mod types;

pub use error::ToolError;
pub use handler::conversation::{CAPABILITY_OVERVIEW, CODE_LANGUAGES};
pub use handler::{ToolHandler, ToolRegistry, ToolServices};
pub use types::{
    DocumentDigest, DocumentInput, EmailKind, EmailRequest, FallbackKind, FallbackNotice,
    ImageMode, NewsScope, ToolArgs, ToolOutput,
};
