//! Local models served by Ollama
//!
//! Talks to `/api/chat` with streaming off. Debate agents reply in JSON, so
//! JSON output mode is on by default; turn it off with
//! [`OllamaProvider::with_json_output`] for free-form prompts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::chat::{ensure_success, messages, ChatMessage};
use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    message: ChatMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl ChatReply {
    fn tokens_used(&self) -> Option<u32> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (prompt, reply) => Some(prompt.unwrap_or(0) + reply.unwrap_or(0)),
        }
    }
}

/// Provider for a local Ollama server; calls cost nothing
#[derive(Debug)]
pub struct OllamaProvider {
    base_url: String,
    /// Model used when a request names none (e.g. "llama3.1", "qwen2.5")
    model: String,
    json_output: bool,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Use the server on localhost
    pub fn new(model: &str) -> Self {
        Self::with_url(DEFAULT_OLLAMA_URL, model)
    }

    pub fn with_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            json_output: true,
            client: reqwest::Client::new(),
        }
    }

    /// Ask the server to constrain replies to JSON
    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    fn chat_request(&self, request: &LlmRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: messages(request),
            stream: false,
            format: self.json_output.then_some("json"),
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        match self.client.get(format!("{}/api/tags", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let body = self.chat_request(&request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        let reply: ChatReply = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let tokens_used = reply.tokens_used();
        Ok(LlmResponse {
            content: reply.message.content,
            model: reply.model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
            cost: 0.0,
        })
    }
}
