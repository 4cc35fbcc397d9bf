//! Text-to-Cypher synthesis

use crate::config::SamplingConfig;
use crate::conversation::ChatTurn;
use crate::llm::{CompletionRequest, InferenceClient, LlmResult};
use std::sync::Arc;

/// System prompt for query generation, with the rendered schema interpolated
pub fn system_message(grounding: &str) -> String {
    format!(
        "Task: Generate Cypher queries to query a Neo4j graph database based on the provided schema definition.

Instructions:
Use only the provided relationship types and properties.
Do not use any other relationship types or properties that are not provided.
If you cannot generate a Cypher statement based on the provided schema, explain the reason to the user.

Schema:
{}

Note: Do not include any explanations or apologies in your responses. Also, do not prompt the user to enter another response.",
        grounding
    )
}

/// Turns one inference call into one candidate query
pub struct QuerySynthesizer {
    llm: Arc<dyn InferenceClient>,
    model: String,
    sampling: SamplingConfig,
}

impl QuerySynthesizer {
    pub fn new(llm: Arc<dyn InferenceClient>, model: impl Into<String>, sampling: SamplingConfig) -> Self {
        Self {
            llm,
            model: model.into(),
            sampling,
        }
    }

    /// System grounding turn, user question, then `history` in order
    pub fn conversation(question: &str, grounding: &str, history: &[ChatTurn]) -> Vec<ChatTurn> {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn::system(system_message(grounding)));
        turns.push(ChatTurn::user(question));
        turns.extend(history.iter().cloned());
        turns
    }

    /// Corrective history for a query the database rejected as malformed
    pub fn correction_turns(question: &str, grounding: &str, failed_query: &str, error: &str) -> Vec<ChatTurn> {
        vec![
            ChatTurn::system(system_message(grounding)),
            ChatTurn::user(question),
            ChatTurn::assistant(failed_query),
            ChatTurn::user(format!(
                "This query returns an error: {}. Give me an improved query that works without any explanations or apologies.",
                error
            )),
        ]
    }

    /// Ask for a query; the completion is returned verbatim.
    pub async fn synthesize(&self, question: &str, grounding: &str, history: &[ChatTurn]) -> LlmResult<String> {
        let request = CompletionRequest::new(
            Self::conversation(question, grounding, history),
            self.model.clone(),
            self.sampling,
        );
        self.llm.complete(&request).await
    }
}
