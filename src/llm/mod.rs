//! Inference boundary
//!
//! Chat-style completion: an ordered list of turns, a model, a sampling
//! temperature and an output budget in, a single text completion out.

pub mod client;

pub use client::ChatClient;

use crate::config::SamplingConfig;
use crate::conversation::ChatTurn;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// One chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub turns: Vec<ChatTurn>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(turns: Vec<ChatTurn>, model: impl Into<String>, sampling: SamplingConfig) -> Self {
        Self {
            turns,
            model: model.into(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }
}

/// Capability interface over a chat completion endpoint
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;
}
