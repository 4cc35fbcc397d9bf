//! cypher-qa
//!
//! Natural-language question answering over a Neo4j graph. A question is
//! translated into Cypher by an LLM grounded in the live schema, executed,
//! repaired when the database rejects its syntax, and the result is narrated
//! back in plain English.
//!
//! # Architecture
//!
//! - `schema`: APOC metadata extraction and the grounding text renderer
//! - `nlq`: query synthesis, execution, narration and the bounded repair loop
//! - `database`: the `GraphDatabase` capability and the Neo4j HTTP client
//! - `llm`: the `InferenceClient` capability and the chat completion client
//! - `session`: ties the above together around one schema snapshot
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cypher_qa::{QaConfig, QaSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cypher_qa::QaError> {
//!     let mut config = QaConfig::default();
//!     config.apply_env();
//!
//!     let session = QaSession::connect(config).await?;
//!     let answer = session.ask("Which person has the most friends?").await;
//!     session.close().await?;
//!
//!     println!("{}", answer?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod conversation;
pub mod database;
pub mod error;
pub mod llm;
pub mod nlq;
pub mod result;
pub mod schema;
pub mod session;

// Re-export main types for convenience
pub use config::{DatabaseConfig, LLMProvider, LlmConfig, QaConfig, SamplingConfig};
pub use conversation::{ChatTurn, Role};
pub use database::{DatabaseError, DatabaseResult, GraphDatabase, Neo4jHttpClient, QueryParams};
pub use error::{QaError, QaResult};
pub use llm::{ChatClient, CompletionRequest, InferenceClient, LlmError, LlmResult};
pub use nlq::{
    Attempt, AttemptOutcome, Execution, LoopPhase, QueryExecutor, QueryObserver, QuerySynthesizer,
    RepairLoop, RepairOutcome, RepairReport, ResultNarrator, EXHAUSTED_MESSAGE,
};
pub use result::ResultSet;
pub use schema::{render_schema, SchemaDescriptor, SchemaExtractor};
pub use session::QaSession;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
