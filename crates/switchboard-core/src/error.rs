use thiserror::Error;

/// Top-level error type for Switchboard.
///
/// Collaborator crates define their own error enums; this type covers the
/// shared concerns (configuration, I/O, payload decoding) and is what the
/// binary surfaces at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("Payload too large: {size} bytes exceeds {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl From<toml::de::Error> for SwitchboardError {
    fn from(err: toml::de::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SwitchboardError {
    fn from(err: toml::ser::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SwitchboardError {
    fn from(err: serde_json::Error) -> Self {
        SwitchboardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
