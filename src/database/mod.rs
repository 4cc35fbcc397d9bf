//! Graph database boundary
//!
//! The question-answering pipeline only needs one capability from the
//! database: run a Cypher statement with parameters and get a tabular result
//! back. `GraphDatabase` captures that so the pipeline can be driven by the
//! Neo4j HTTP client in production and by in-process fakes in tests.

pub mod neo4j;

pub use neo4j::Neo4jHttpClient;

use crate::result::{ArityMismatch, ResultSet};
use async_trait::async_trait;
use thiserror::Error;

/// Statement parameters: unique keys, scalar or composite values
pub type QueryParams = serde_json::Map<String, serde_json::Value>;

/// Neo4j status code reported for malformed Cypher text
pub const SYNTAX_ERROR_CODE: &str = "Neo.ClientError.Statement.SyntaxError";

/// Older servers report some parser failures under this code instead
pub const INVALID_SYNTAX_CODE: &str = "Neo.ClientError.Statement.InvalidSyntax";

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The database parser rejected the statement text
    #[error("Syntax error ({code}): {message}")]
    Syntax { code: String, message: String },

    /// Any other error reported by the database for a statement
    #[error("Query error ({code}): {message}")]
    Query { code: String, message: String },

    /// Credentials rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Endpoint unreachable or transport failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Unexpected response shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Classify a status code/message pair reported by Neo4j
    pub fn from_status(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if code == SYNTAX_ERROR_CODE || code == INVALID_SYNTAX_CODE {
            DatabaseError::Syntax { code, message }
        } else if code.starts_with("Neo.ClientError.Security.") {
            DatabaseError::Auth(format!("{}: {}", code, message))
        } else {
            DatabaseError::Query { code, message }
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, DatabaseError::Syntax { .. })
    }
}

impl From<ArityMismatch> for DatabaseError {
    fn from(err: ArityMismatch) -> Self {
        DatabaseError::Protocol(err.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Capability interface over a graph database.
///
/// Every call to `run` acquires its own scoped session and releases it before
/// returning, whatever the outcome.
#[async_trait]
pub trait GraphDatabase: Send + Sync {
    /// Execute a Cypher statement and materialize its rows
    async fn run(&self, query: &str, params: &QueryParams) -> DatabaseResult<ResultSet>;

    /// Check that the database is reachable and the credentials are accepted
    async fn verify(&self) -> DatabaseResult<()> {
        self.run("RETURN 1 AS ok", &QueryParams::new()).await.map(|_| ())
    }

    /// Release process-wide resources held by the handle
    async fn close(&self) -> DatabaseResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_syntax_errors() {
        let err = DatabaseError::from_status(SYNTAX_ERROR_CODE, "Invalid input 'X'");
        assert!(err.is_syntax());

        let err = DatabaseError::from_status(INVALID_SYNTAX_CODE, "Invalid input");
        assert!(err.is_syntax());

        let err = DatabaseError::from_status("Neo.ClientError.Statement.SemanticError", "unknown fn");
        assert!(!err.is_syntax());

        let err = DatabaseError::from_status("Neo.ClientError.Security.Unauthorized", "bad creds");
        assert!(matches!(err, DatabaseError::Auth(_)));

        let err = DatabaseError::from_status("Neo.ClientError.Statement.EntityNotFound", "gone");
        assert!(matches!(err, DatabaseError::Query { .. }));
        assert!(!err.is_syntax());
    }
}
