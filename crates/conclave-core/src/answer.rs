//! Structured answers produced by debate agents
//!
//! A [`StructuredAnswer`] is the only shape in which an agent's opinion
//! enters the debate. Raw model output is parsed into it at the agent
//! boundary; anything that does not parse becomes a degraded answer.

use serde::{Deserialize, Serialize};

/// Confidence assigned to answers synthesized from unparseable output
pub const DEGRADED_CONFIDENCE: u8 = 50;

/// One agent's answer for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// The position taken, as free text
    pub answer: String,
    /// Why the agent holds this position
    pub reasoning: String,
    /// Confidence in the answer (0 - 100)
    pub confidence: u8,
    /// Evidence items cited by the agent
    pub evidence: Vec<String>,
    /// Name of the agent that produced this answer
    pub agent_name: String,
    /// Model that backed the agent for this answer
    pub model_id: String,
    /// True when the answer was synthesized from output that did not parse
    #[serde(default)]
    pub degraded: bool,
}

impl StructuredAnswer {
    /// Create an answer with a clamped confidence
    pub fn new(
        agent_name: impl Into<String>,
        model_id: impl Into<String>,
        answer: impl Into<String>,
        confidence: i64,
    ) -> Self {
        Self {
            answer: answer.into(),
            reasoning: String::new(),
            confidence: clamp_confidence(confidence),
            evidence: Vec::new(),
            agent_name: agent_name.into(),
            model_id: model_id.into(),
            degraded: false,
        }
    }

    /// Synthesize a degraded answer from raw model text
    pub fn degraded(
        agent_name: impl Into<String>,
        model_id: impl Into<String>,
        raw: &str,
    ) -> Self {
        Self {
            answer: raw.trim().to_string(),
            reasoning: String::new(),
            confidence: DEGRADED_CONFIDENCE,
            evidence: Vec::new(),
            agent_name: agent_name.into(),
            model_id: model_id.into(),
            degraded: true,
        }
    }

    /// Set the reasoning
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Set the evidence items
    pub fn with_evidence<I, S>(mut self, evidence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evidence = evidence.into_iter().map(Into::into).collect();
        self
    }

    /// Confidence as a fraction (0.0 - 1.0)
    pub fn confidence_fraction(&self) -> f64 {
        f64::from(self.confidence) / 100.0
    }
}

/// Clamp an arbitrary integer confidence into `[0, 100]`
pub fn clamp_confidence(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
