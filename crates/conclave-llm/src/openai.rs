//! OpenAI-compatible chat completions provider
//!
//! Works against api.openai.com and any gateway speaking the same
//! `/v1/chat/completions` dialect (OpenRouter, vLLM, LiteLLM).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::chat::{ensure_success, messages, ChatMessage};
use crate::provider::{estimate_cost, LlmError, LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
    model: String,
    usage: Option<Usage>,
}

impl Completion {
    /// Text of the first choice; refusals and tool calls carry none
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// OpenAI-compatible provider, priced per 1K tokens
#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    /// Model used when a request names none
    model: String,
    base_url: String,
    /// Blended USD price per 1K tokens used for cost accounting
    price_per_1k: f64,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            price_per_1k: 0.005,
            client: reqwest::Client::new(),
        }
    }

    /// Point at a compatible gateway (without the `/v1` suffix)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the price used for cost accounting
    pub fn with_price_per_1k(mut self, price: f64) -> Self {
        self.price_per_1k = price;
        self
    }

    pub fn gpt4o(api_key: &str) -> Self {
        Self::new(api_key, "gpt-4o")
    }

    pub fn gpt4o_mini(api_key: &str) -> Self {
        Self::new(api_key, "gpt-4o-mini").with_price_per_1k(0.0003)
    }

    fn completion_request(&self, request: &LlmRequest) -> CompletionRequest {
        CompletionRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        let models = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        matches!(models, Ok(response) if response.status().is_success())
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let body = self.completion_request(&request);

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        let completion: Completion = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let tokens_used = completion.usage.as_ref().map(|u| u.total_tokens);
        let model = completion.model.clone();
        Ok(LlmResponse {
            content: completion.into_text(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
            cost: estimate_cost(tokens_used, self.price_per_1k),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_configuration() {
        let provider = OpenAIProvider::gpt4o("sk-test").with_base_url("https://openrouter.ai/api/");
        assert_eq!(provider.base_url, "https://openrouter.ai/api");

        let body = provider.completion_request(&LlmRequest::simple("Expand?"));
        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.messages.len(), 2);
    }

    #[test]
    fn test_null_content_is_empty_text() {
        let body = r#"{"choices":[{"message":{"content":null}}],"model":"gpt-4o","usage":{"total_tokens":12}}"#;
        let completion: Completion = serde_json::from_str(body).unwrap();
        assert_eq!(completion.usage.as_ref().unwrap().total_tokens, 12);
        assert_eq!(completion.into_text(), "");

        let body = r#"{"choices":[],"model":"gpt-4o"}"#;
        let completion: Completion = serde_json::from_str(body).unwrap();
        assert_eq!(completion.into_text(), "");
    }
}
