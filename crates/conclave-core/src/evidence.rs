//! Evidence collected for or against a hypothesis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::clamp_confidence;

/// A single piece of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    /// Where the evidence came from (e.g. `debate:<id>`, a URL, an interview)
    pub source: String,
    pub content: String,
    /// Whether the evidence supports the hypothesis
    pub supports: bool,
    /// Confidence in the evidence (0 - 100)
    pub confidence: u8,
    pub collected_at: DateTime<Utc>,
    /// Agent or person that collected it
    pub collected_by: String,
}

impl Evidence {
    /// Create a new evidence record
    pub fn new(
        source: impl Into<String>,
        content: impl Into<String>,
        supports: bool,
        confidence: i64,
        collected_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            supports,
            confidence: clamp_confidence(confidence),
            collected_at: Utc::now(),
            collected_by: collected_by.into(),
        }
    }
}
