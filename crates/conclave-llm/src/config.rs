//! Configuration management for LLM providers
//!
//! Handles API keys, provider selection and default models.

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::mock::MockProvider;
use crate::ollama::{OllamaProvider, DEFAULT_OLLAMA_URL};
use crate::openai::OpenAIProvider;
use crate::provider::LlmProvider;

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible base URL (env: OPENAI_BASE_URL)
    pub openai_base_url: Option<String>,
    /// Ollama base URL (default: http://localhost:11434)
    pub ollama_url: String,
    /// Default provider
    pub default_provider: String,
    /// Default model
    pub default_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            default_provider: "mock".to_string(),
            default_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            default_provider: env::var("CONCLAVE_DEFAULT_PROVIDER")
                .unwrap_or(defaults.default_provider),
            default_model: env::var("CONCLAVE_DEFAULT_MODEL").unwrap_or(defaults.default_model),
        }
    }

    /// Check if a provider is configured
    pub fn is_configured(&self, provider: &str) -> bool {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" | "mock" => true, // Always available
            _ => false,
        }
    }

    /// Build the named provider with the given default model
    pub fn build_provider(
        &self,
        provider: &str,
        model: &str,
    ) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        match provider.to_lowercase().as_str() {
            "mock" => Ok(Arc::new(MockProvider::smart())),
            "ollama" => Ok(Arc::new(OllamaProvider::with_url(&self.ollama_url, model))),
            "openai" => {
                let key = self
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
                let mut openai = OpenAIProvider::new(key, model);
                if let Some(url) = &self.openai_base_url {
                    openai = openai.with_base_url(url);
                }
                Ok(Arc::new(openai))
            }
            other => Err(ConfigError::Invalid(format!("unknown provider '{}'", other))),
        }
    }

    /// Build the default provider with the default model
    pub fn default_llm(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        self.build_provider(&self.default_provider, &self.default_model)
    }
}
