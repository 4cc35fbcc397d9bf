//! Query execution with syntax failures separated from fatal errors

use crate::database::{DatabaseError, DatabaseResult, GraphDatabase, QueryParams};
use crate::result::ResultSet;
use std::sync::Arc;

/// Outcome of executing generated query text
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    Success(ResultSet),
    /// The database parser rejected the text; carries its diagnostic
    SyntaxFailure(String),
}

pub struct QueryExecutor {
    db: Arc<dyn GraphDatabase>,
}

impl QueryExecutor {
    pub fn new(db: Arc<dyn GraphDatabase>) -> Self {
        Self { db }
    }

    pub async fn execute(&self, query: &str) -> DatabaseResult<Execution> {
        self.execute_with_params(query, &QueryParams::new()).await
    }

    /// Only `DatabaseError::Syntax` becomes `SyntaxFailure`; everything else is `Err`.
    pub async fn execute_with_params(&self, query: &str, params: &QueryParams) -> DatabaseResult<Execution> {
        match self.db.run(query, params).await {
            Ok(result) => Ok(Execution::Success(result)),
            Err(DatabaseError::Syntax { message, .. }) => Ok(Execution::SyntaxFailure(message)),
            Err(err) => Err(err),
        }
    }
}
