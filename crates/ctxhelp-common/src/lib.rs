use std::path::PathBuf;

/// Common error types
#[derive(thiserror::Error, Debug)]
pub enum HelpError {
    #[error("Syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("No supported GUI framework detected")]
    NoFrameworkDetected,

    #[error("Invalid help file format: {0}")]
    InvalidFormat(String),

    #[error("Help file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed tag '{tag}': {reason}")]
    MalformedTag { tag: String, reason: String },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HelpError {
    pub fn malformed_tag(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        HelpError::MalformedTag {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HelpError>;
