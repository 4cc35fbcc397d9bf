//! Question-answering session
//!
//! Owns the database and inference handles for the lifetime of the process,
//! plus the current schema snapshot. Questions are answered one at a time.

use crate::config::QaConfig;
use crate::database::{GraphDatabase, Neo4jHttpClient};
use crate::error::QaResult;
use crate::llm::{ChatClient, InferenceClient};
use crate::nlq::{
    QueryExecutor, QueryObserver, QuerySynthesizer, RepairLoop, RepairReport, ResultNarrator,
};
use crate::schema::{render_schema, SchemaDescriptor, SchemaExtractor};
use std::sync::Arc;
use tracing::info;

pub struct QaSession {
    db: Arc<dyn GraphDatabase>,
    repair_loop: RepairLoop,
    schema: SchemaDescriptor,
    grounding: String,
}

impl QaSession {
    /// Connect to Neo4j and the configured LLM provider, then snapshot the schema
    pub async fn connect(config: QaConfig) -> QaResult<Self> {
        config.validate()?;
        let db = Arc::new(Neo4jHttpClient::new(&config.database)?);
        let llm = Arc::new(ChatClient::new(&config.llm)?);
        Self::with_backends(db, llm, &config).await
    }

    /// Build a session over arbitrary backends
    pub async fn with_backends(
        db: Arc<dyn GraphDatabase>,
        llm: Arc<dyn InferenceClient>,
        config: &QaConfig,
    ) -> QaResult<Self> {
        db.verify().await?;
        info!("Connected to graph database");

        let schema = SchemaExtractor::new(db.as_ref()).extract().await?;
        let grounding = render_schema(&schema);

        let repair_loop = RepairLoop::new(
            QuerySynthesizer::new(llm.clone(), config.llm.model.clone(), config.synthesis),
            QueryExecutor::new(db.clone()),
            ResultNarrator::new(llm, config.llm.model.clone(), config.narration),
            config.max_attempts,
        );

        Ok(Self {
            db,
            repair_loop,
            schema,
            grounding,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Rendered schema used as grounding context
    pub fn grounding(&self) -> &str {
        &self.grounding
    }

    /// Show every generated query to `observer` before it is executed
    pub fn set_query_observer(&mut self, observer: Arc<dyn QueryObserver>) {
        self.repair_loop.set_observer(observer);
    }

    /// Re-read the schema. The current snapshot is kept if extraction fails.
    pub async fn refresh_schema(&mut self) -> QaResult<()> {
        let schema = SchemaExtractor::new(self.db.as_ref()).extract().await?;
        self.grounding = render_schema(&schema);
        self.schema = schema;
        info!("Schema refreshed");
        Ok(())
    }

    /// Answer a question: narrated text, or the exhaustion message
    pub async fn ask(&self, question: &str) -> QaResult<String> {
        Ok(self.ask_with_report(question).await?.answer)
    }

    /// Answer a question and return every attempt along with the answer
    pub async fn ask_with_report(&self, question: &str) -> QaResult<RepairReport> {
        self.repair_loop.run(question, &self.grounding).await
    }

    pub async fn close(self) -> QaResult<()> {
        self.db.close().await?;
        info!("Connection closed");
        Ok(())
    }
}
