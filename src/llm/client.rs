//! Chat completion client for the supported LLM providers

use crate::config::{LLMProvider, LlmConfig};
use crate::conversation::{ChatTurn, Role};
use crate::llm::{CompletionRequest, InferenceClient, LlmError, LlmResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct ChatClient {
    client: Client,
    provider: LLMProvider,
    api_key: Option<String>,
    api_base_url: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(LlmError::ConfigError(format!("{:?} requires API key", config.provider)));
        }

        Ok(Self {
            client,
            provider: config.provider,
            api_key: config.api_key.clone(),
            api_base_url: config.base_url(),
        })
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LlmError::ConfigError(format!("{:?} requires API key", self.provider)))
    }

    async fn openai_chat(&self, request: &CompletionRequest) -> LlmResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&openai::Request::from(request))
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!("OpenAI error: {} {}", status, text)));
        }

        let result: openai::Response = resp.json().await.map_err(|e| LlmError::SerializationError(e.to_string()))?;
        result.choices.into_iter().next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::ApiError("OpenAI returned no choices".to_string()))
    }

    async fn ollama_chat(&self, request: &CompletionRequest) -> LlmResult<String> {
        let url = format!("{}/api/chat", self.api_base_url);
        let resp = self.client.post(&url)
            .json(&ollama::Request::from(request))
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LlmError::ApiError(format!("Ollama error: {}", resp.status())));
        }

        let result: ollama::Response = resp.json().await.map_err(|e| LlmError::SerializationError(e.to_string()))?;
        Ok(result.message.content)
    }

    async fn gemini_chat(&self, request: &CompletionRequest) -> LlmResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}:generateContent?key={}", self.api_base_url, request.model, api_key);

        let resp = self.client.post(&url)
            .json(&gemini::Request::from(request))
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!("Gemini error: {}", text)));
        }

        let result: gemini::Response = resp.json().await.map_err(|e| LlmError::SerializationError(e.to_string()))?;
        result.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| LlmError::ApiError("Gemini returned no candidates".to_string()))
    }
}

#[async_trait]
impl InferenceClient for ChatClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        debug!(
            provider = ?self.provider,
            model = %request.model,
            turns = request.turns.len(),
            temperature = request.temperature,
            "Sending chat completion"
        );
        match self.provider {
            LLMProvider::OpenAI => self.openai_chat(request).await,
            LLMProvider::Ollama => self.ollama_chat(request).await,
            LLMProvider::Gemini => self.gemini_chat(request).await,
        }
    }
}

/// Wire format of `/chat/completions`
mod openai {
    use super::*;

    #[derive(Serialize)]
    pub struct Request<'a> {
        pub model: &'a str,
        pub messages: &'a [ChatTurn],
        pub temperature: f32,
        pub max_tokens: u32,
    }

    impl<'a> From<&'a CompletionRequest> for Request<'a> {
        fn from(request: &'a CompletionRequest) -> Self {
            Self {
                model: &request.model,
                messages: &request.turns,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Response {
        pub choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    pub struct Choice {
        pub message: MessageContent,
    }

    #[derive(Deserialize)]
    pub struct MessageContent {
        pub content: Option<String>,
    }
}

/// Wire format of Ollama's `/api/chat`
mod ollama {
    use super::*;

    #[derive(Serialize)]
    pub struct Request<'a> {
        pub model: &'a str,
        pub messages: &'a [ChatTurn],
        pub stream: bool,
        pub options: Options,
    }

    #[derive(Serialize)]
    pub struct Options {
        pub temperature: f32,
        pub num_predict: u32,
    }

    impl<'a> From<&'a CompletionRequest> for Request<'a> {
        fn from(request: &'a CompletionRequest) -> Self {
            Self {
                model: &request.model,
                messages: &request.turns,
                stream: false,
                options: Options {
                    temperature: request.temperature,
                    num_predict: request.max_tokens,
                },
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Response {
        pub message: Message,
    }

    #[derive(Deserialize)]
    pub struct Message {
        pub content: String,
    }
}

/// Wire format of Gemini's `generateContent`
mod gemini {
    use super::*;

    #[derive(Serialize)]
    pub struct Request {
        #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
        pub system_instruction: Option<Content>,
        pub contents: Vec<Content>,
        #[serde(rename = "generationConfig")]
        pub generation_config: GenerationConfig,
    }

    #[derive(Serialize, Deserialize)]
    pub struct Content {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub role: Option<String>,
        pub parts: Vec<Part>,
    }

    #[derive(Serialize, Deserialize)]
    pub struct Part {
        pub text: String,
    }

    #[derive(Serialize)]
    pub struct GenerationConfig {
        pub temperature: f32,
        #[serde(rename = "maxOutputTokens")]
        pub max_output_tokens: u32,
    }

    impl From<&CompletionRequest> for Request {
        fn from(request: &CompletionRequest) -> Self {
            // Gemini takes system text separately and names the assistant "model".
            let system: Vec<Part> = request.turns.iter()
                .filter(|turn| turn.role == Role::System)
                .map(|turn| Part { text: turn.content.clone() })
                .collect();

            let contents = request.turns.iter()
                .filter(|turn| turn.role != Role::System)
                .map(|turn| Content {
                    role: Some(match turn.role {
                        Role::Assistant => "model".to_string(),
                        _ => "user".to_string(),
                    }),
                    parts: vec![Part { text: turn.content.clone() }],
                })
                .collect();

            Self {
                system_instruction: if system.is_empty() {
                    None
                } else {
                    Some(Content { role: None, parts: system })
                },
                contents,
                generation_config: GenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_tokens,
                },
            }
        }
    }

    #[derive(Deserialize)]
    pub struct Response {
        pub candidates: Option<Vec<Candidate>>,
    }

    #[derive(Deserialize)]
    pub struct Candidate {
        pub content: Content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            vec![
                ChatTurn::system("schema"),
                ChatTurn::user("How many people?"),
                ChatTurn::assistant("MATCH (p:Person) RETURN count(p)"),
            ],
            "gpt-4",
            SamplingConfig::synthesis(),
        )
    }

    #[test]
    fn test_openai_body() {
        let req = request();
        let body = serde_json::to_value(openai::Request::from(&req)).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_ollama_body() {
        let req = request();
        let body = serde_json::to_value(ollama::Request::from(&req)).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_gemini_body_splits_system_turns() {
        let req = request();
        let body = serde_json::to_value(gemini::Request::from(&req)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "schema");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig::default();
        assert!(matches!(ChatClient::new(&config), Err(LlmError::ConfigError(_))));

        let config = LlmConfig { provider: LLMProvider::Ollama, ..LlmConfig::default() };
        assert!(ChatClient::new(&config).is_ok());
    }
}
