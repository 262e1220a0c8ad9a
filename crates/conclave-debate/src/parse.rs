//! Parsing raw model output into structured answers
//!
//! This is the only place where free text crosses into the data model.
//! Parsing never fails: output that cannot be read as the JSON contract
//! becomes [`ParsedReply::Unparsed`] and later a degraded answer.

use serde::Deserialize;
use serde_json::Value;

use conclave_core::{clamp_confidence, StructuredAnswer, DEGRADED_CONFIDENCE};

/// Fields of the JSON contract, as the model sent them
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerPayload {
    #[serde(alias = "position", alias = "conclusion", alias = "verdict")]
    pub answer: String,
    #[serde(default, alias = "rationale", alias = "explanation")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default, alias = "sources", alias = "supporting_evidence")]
    pub evidence: Option<Value>,
}

impl AnswerPayload {
    /// Confidence on the 0 - 100 scale, `None` if absent or unreadable
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence.as_ref().and_then(confidence_from_value)
    }

    /// Evidence as a list of non-empty strings
    pub fn evidence_items(&self) -> Vec<String> {
        match &self.evidence {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }
}

/// Result of reading a model reply
#[derive(Debug, Clone)]
pub enum ParsedReply {
    /// The reply followed the JSON contract
    Structured(AnswerPayload),
    /// The reply could not be read; holds the raw text
    Unparsed(String),
}

impl ParsedReply {
    /// Whether the reply followed the contract
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Turn the reply into an answer attributed to an agent
    pub fn into_answer(self, agent_name: &str, model_id: &str) -> StructuredAnswer {
        match self {
            Self::Structured(payload) => {
                let confidence = payload
                    .confidence_percent()
                    .unwrap_or(DEGRADED_CONFIDENCE);
                let evidence = payload.evidence_items();
                StructuredAnswer::new(
                    agent_name,
                    model_id,
                    payload.answer.trim(),
                    i64::from(confidence),
                )
                .with_reasoning(payload.reasoning.unwrap_or_default().trim())
                .with_evidence(evidence)
            }
            Self::Unparsed(raw) => StructuredAnswer::degraded(agent_name, model_id, &raw),
        }
    }
}

/// Read a model reply: fenced JSON block, then whole text, then the outermost braces
pub fn parse_reply(raw: &str) -> ParsedReply {
    let candidates = [
        fenced_block(raw),
        Some(raw.trim()),
        brace_slice(raw),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(payload) = serde_json::from_str::<AnswerPayload>(candidate) {
            if !payload.answer.trim().is_empty() {
                return ParsedReply::Structured(payload);
            }
        }
    }

    tracing::debug!(len = raw.len(), "Reply did not match the answer contract");
    ParsedReply::Unparsed(raw.to_string())
}

/// Contents of the first ``` fenced block, preferring one tagged `json`
fn fenced_block(raw: &str) -> Option<&str> {
    let lower = raw.to_ascii_lowercase();
    let (open, skip) = match lower.find("```json") {
        Some(idx) => (idx, "```json".len()),
        None => (lower.find("```")?, 3),
    };
    let body_start = open + skip;
    let close = raw[body_start..].find("```")? + body_start;
    let body = raw[body_start..close].trim();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn brace_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Read a confidence given as an integer, a float, a 0-1 fraction or a "85%" string
pub fn confidence_from_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(clamp_confidence(i))
            } else {
                n.as_f64().map(percent_from_float)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let (number, is_percent) = match trimmed.strip_suffix('%') {
                Some(stripped) => (stripped.trim(), true),
                None => (trimmed, false),
            };
            let parsed: f64 = number.parse().ok()?;
            if is_percent {
                Some(clamp_confidence(parsed.round() as i64))
            } else if number.contains('.') {
                Some(percent_from_float(parsed))
            } else {
                Some(clamp_confidence(parsed as i64))
            }
        }
        _ => None,
    }
}

fn percent_from_float(value: f64) -> u8 {
    if !value.is_finite() {
        return DEGRADED_CONFIDENCE;
    }
    let scaled = if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    };
    clamp_confidence(scaled.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let raw = r#"{"answer": "Expand", "reasoning": "Demand is there", "confidence": 85, "evidence": ["Q2 sales up 30%"]}"#;
        let answer = parse_reply(raw).into_answer("analyst", "gpt-4o");

        assert!(!answer.degraded);
        assert_eq!(answer.answer, "Expand");
        assert_eq!(answer.reasoning, "Demand is there");
        assert_eq!(answer.confidence, 85);
        assert_eq!(answer.evidence, vec!["Q2 sales up 30%"]);
        assert_eq!(answer.model_id, "gpt-4o");
    }

    #[test]
    fn test_fenced_block_with_prose() {
        let raw = "Here is my view.\n\n```json\n{\"answer\": \"No\", \"confidence\": 0.7}\n```\nThanks!";
        let reply = parse_reply(raw);
        assert!(reply.is_structured());

        let answer = reply.into_answer("skeptic", "m");
        assert_eq!(answer.answer, "No");
        assert_eq!(answer.confidence, 70);
        assert!(answer.evidence.is_empty());
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\n{\"answer\": \"Maybe\", \"confidence\": \"65%\"}\n```";
        let answer = parse_reply(raw).into_answer("a", "m");
        assert_eq!(answer.answer, "Maybe");
        assert_eq!(answer.confidence, 65);
    }

    #[test]
    fn test_braces_inside_prose() {
        let raw = "Sure: {\"position\": \"Delay launch\", \"confidence\": 140, \"evidence\": \"QA backlog\"} hope it helps";
        let answer = parse_reply(raw).into_answer("a", "m");
        assert_eq!(answer.answer, "Delay launch");
        assert_eq!(answer.confidence, 100);
        assert_eq!(answer.evidence, vec!["QA backlog"]);
    }

    #[test]
    fn test_unparseable_degrades() {
        let raw = "I think we should probably expand, honestly.";
        let reply = parse_reply(raw);
        assert!(!reply.is_structured());

        let answer = reply.into_answer("pragmatist", "m");
        assert!(answer.degraded);
        assert_eq!(answer.answer, raw);
        assert_eq!(answer.confidence, DEGRADED_CONFIDENCE);
    }

    #[test]
    fn test_empty_answer_degrades() {
        let answer = parse_reply(r#"{"answer": "  ", "confidence": 90}"#).into_answer("a", "m");
        assert!(answer.degraded);
    }

    #[test]
    fn test_missing_confidence_defaults() {
        let answer = parse_reply(r#"{"answer": "Yes"}"#).into_answer("a", "m");
        assert!(!answer.degraded);
        assert_eq!(answer.confidence, DEGRADED_CONFIDENCE);
    }

    #[test]
    fn test_confidence_forms() {
        assert_eq!(confidence_from_value(&serde_json::json!(-5)), Some(0));
        assert_eq!(confidence_from_value(&serde_json::json!(0.95)), Some(95));
        assert_eq!(confidence_from_value(&serde_json::json!(72.6)), Some(73));
        assert_eq!(confidence_from_value(&serde_json::json!("80")), Some(80));
        assert_eq!(confidence_from_value(&serde_json::json!("0.4")), Some(40));
        assert_eq!(confidence_from_value(&serde_json::json!("high")), None);
        assert_eq!(confidence_from_value(&serde_json::json!(null)), None);
    }
}
