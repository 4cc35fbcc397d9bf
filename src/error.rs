//! Top-level error type for the question-answering session

use crate::database::DatabaseError;
use crate::llm::LlmError;
use thiserror::Error;

/// Fatal errors that abort answering a question.
///
/// Syntax failures of generated queries are not represented here: the
/// repair loop consumes them and only surfaces exhaustion as a normal answer.
#[derive(Error, Debug)]
pub enum QaError {
    /// Database failure (connectivity, auth, non-syntax query errors)
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Inference endpoint failure
    #[error("Inference error: {0}")]
    Llm(#[from] LlmError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type QaResult<T> = Result<T, QaError>;
