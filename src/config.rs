//! Session configuration
//!
//! Settings come from three layers, later ones winning: a YAML file,
//! environment variables, then whatever the caller sets on the struct
//! (the CLI applies its flags last).

use crate::error::{QaError, QaResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// LLM provider options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Ollama,
    Gemini,
}

impl LLMProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Ollama => "http://localhost:11434",
            LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

/// Connection settings for the Neo4j HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:7474`
    pub url: String,
    pub username: String,
    pub password: Option<String>,
    /// Database name (Neo4j 4+ multi-database)
    pub database: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: None,
            database: "neo4j".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Inference endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LLMProvider,
    /// Model name (e.g., "gpt-4", "llama3")
    pub model: String,
    /// API Key (required for OpenAI and Gemini)
    pub api_key: Option<String>,
    /// Overrides the provider's default base URL
    pub api_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            model: "gpt-4".to_string(),
            api_key: None,
            api_base_url: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

/// Temperature and output budget for one kind of inference call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingConfig {
    /// Near-deterministic, short: query synthesis
    pub fn synthesis() -> Self {
        Self { temperature: 0.0, max_tokens: 1000 }
    }

    /// Fluent, longer: result narration
    pub fn narration() -> Self {
        Self { temperature: 0.7, max_tokens: 500 }
    }
}

/// A sampling section as written in YAML; either field may be left out
#[derive(Deserialize)]
struct SamplingOverride {
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl SamplingOverride {
    fn over(self, base: SamplingConfig) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature.unwrap_or(base.temperature),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
        }
    }
}

fn synthesis_sampling<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SamplingConfig, D::Error> {
    SamplingOverride::deserialize(deserializer).map(|o| o.over(SamplingConfig::synthesis()))
}

fn narration_sampling<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SamplingConfig, D::Error> {
    SamplingOverride::deserialize(deserializer).map(|o| o.over(SamplingConfig::narration()))
}

/// Complete configuration of a question-answering session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    #[serde(deserialize_with = "synthesis_sampling")]
    pub synthesis: SamplingConfig,
    #[serde(deserialize_with = "narration_sampling")]
    pub narration: SamplingConfig,
    /// Syntax failures tolerated before giving up on a question
    pub max_attempts: u32,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            synthesis: SamplingConfig::synthesis(),
            narration: SamplingConfig::narration(),
            max_attempts: 3,
        }
    }
}

impl QaConfig {
    pub fn from_yaml_str(yaml: &str) -> QaResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> QaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get("NEO4J_URL") {
            self.database.url = url;
        }
        if let Some(username) = get("NEO4J_USERNAME") {
            self.database.username = username;
        }
        if let Some(password) = get("NEO4J_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(database) = get("NEO4J_DATABASE") {
            self.database.database = database;
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Some(model) = get("CYPHER_QA_MODEL") {
            self.llm.model = model;
        }
    }

    pub fn validate(&self) -> QaResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(QaError::Config("database url must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(QaError::Config("llm model must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(QaError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.llm.provider.requires_api_key() && self.llm.api_key.is_none() {
            return Err(QaError::Config(format!(
                "{:?} requires an API key",
                self.llm.provider
            )));
        }
        Ok(())
    }
}
