//! Mock LLM provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns predefined responses
/// Perfect for testing without needing actual LLM access
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    /// Canned responses (cycles through them)
    responses: Vec<String>,
    /// Current response index
    index: AtomicUsize,
    /// Simulated latency
    latency: Duration,
    /// Cost reported per call
    cost: f64,
    /// Fail every call with this error
    failure: Option<LlmError>,
    /// Every request seen, in arrival order
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            index: AtomicUsize::new(0),
            latency: Duration::from_millis(5),
            cost: 0.0,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock that answers with the JSON contract agents expect
    pub fn answering(answer: &str, confidence: u8) -> Self {
        Self::constant(&json_answer(answer, confidence, &[]))
    }

    /// Create a mock whose every call fails
    pub fn failing(error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Create a smart mock that responds based on prompt content
    pub fn smart() -> Self {
        Self {
            name: "smart-mock".to_string(),
            ..Self::new(Vec::new())
        }
    }

    /// Set the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the cost reported per call
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Set the provider name
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn generate_smart_response(&self, request: &LlmRequest) -> String {
        let prompt_lower = request.prompt.to_lowercase();

        if prompt_lower.contains("hypothesis") {
            return json_answer(
                "Supported, with caveats",
                72,
                &["Comparable products show similar demand"],
            );
        }

        if prompt_lower.contains("should") || prompt_lower.contains("?") {
            return json_answer("Yes", 80, &["The available context points this way"]);
        }

        format!(
            "I understand you're asking about: \"{}\"",
            request.prompt.chars().take(50).collect::<String>()
        )
    }
}

/// Render an answer in the agent JSON contract
pub fn json_answer(answer: &str, confidence: u8, evidence: &[&str]) -> String {
    serde_json::json!({
        "answer": answer,
        "reasoning": format!("Mock reasoning for '{}'", answer),
        "confidence": confidence,
        "evidence": evidence,
    })
    .to_string()
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.failure.is_none()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        tokio::time::sleep(self.latency).await;

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let content = if self.responses.is_empty() {
            self.generate_smart_response(&request)
        } else {
            // Cycle through canned responses
            let idx = self.index.fetch_add(1, Ordering::Relaxed);
            self.responses[idx % self.responses.len()].clone()
        };

        Ok(LlmResponse {
            content,
            model: request.model.unwrap_or_else(|| self.name.clone()),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
            cost: self.cost,
        })
    }
}
