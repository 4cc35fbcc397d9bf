//! Result narration

use crate::config::SamplingConfig;
use crate::conversation::ChatTurn;
use crate::llm::{CompletionRequest, InferenceClient, LlmResult};
use crate::result::ResultSet;
use std::sync::Arc;

pub const NARRATION_INSTRUCTION: &str =
    "Translate the following Cypher query results into general English format.";

pub struct ResultNarrator {
    llm: Arc<dyn InferenceClient>,
    model: String,
    sampling: SamplingConfig,
}

impl ResultNarrator {
    pub fn new(llm: Arc<dyn InferenceClient>, model: impl Into<String>, sampling: SamplingConfig) -> Self {
        Self {
            llm,
            model: model.into(),
            sampling,
        }
    }

    pub fn conversation(question: &str, results: &ResultSet) -> Vec<ChatTurn> {
        vec![
            ChatTurn::system(NARRATION_INSTRUCTION),
            ChatTurn::user(format!("Question: {}", question)),
            ChatTurn::user(format!("Results: {}", results.render_rows())),
        ]
    }

    pub async fn narrate(&self, question: &str, results: &ResultSet) -> LlmResult<String> {
        let request = CompletionRequest::new(
            Self::conversation(question, results),
            self.model.clone(),
            self.sampling,
        );
        self.llm.complete(&request).await
    }
}
