//! Debate rounds, consensus snapshots and debate results
//!
//! These are plain records. The orchestrator that runs a debate owns its
//! [`DebateResult`] exclusively; once the result reaches a terminal
//! [`DebateStatus`] every mutating method is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::answer::StructuredAnswer;
use crate::error::StateError;

/// How strongly a round's answers agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusLevel {
    /// Broad agreement with high confidence
    Strong,
    /// Broad agreement with moderate confidence
    Moderate,
    /// Simple majority, or too few agents to judge
    Weak,
    /// No majority
    Deadlock,
}

impl ConsensusLevel {
    /// Lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
            Self::Deadlock => "deadlock",
        }
    }
}

impl fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consensus snapshot for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Classified agreement level
    pub level: ConsensusLevel,
    /// Share of agents in the majority group (0.0 - 1.0)
    pub agreement_score: f64,
    /// Confidence-weighted confidence of the majority group (0 - 100)
    pub weighted_confidence: f64,
    /// Representative answer of the majority group
    pub majority_answer: String,
    /// Number of agents in the majority group
    pub majority_count: usize,
    /// Number of answers considered
    pub total_agents: usize,
    /// Answers outside the majority group
    pub dissenting: Vec<StructuredAnswer>,
}

impl ConsensusResult {
    /// The result for a round with no answers
    pub fn empty() -> Self {
        Self {
            level: ConsensusLevel::Deadlock,
            agreement_score: 0.0,
            weighted_confidence: 0.0,
            majority_answer: String::new(),
            majority_count: 0,
            total_agents: 0,
            dissenting: Vec::new(),
        }
    }
}

/// A single synchronized collection of answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    /// Zero-based round number
    pub round_number: u32,
    /// Answers collected from agents this round
    pub answers: Vec<StructuredAnswer>,
    /// Consensus detected over `answers`
    pub consensus: Option<ConsensusResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl DebateRound {
    /// The answer with the highest confidence (first wins on ties)
    pub fn highest_confidence_answer(&self) -> Option<&StructuredAnswer> {
        self.answers
            .iter()
            .fold(None, |best: Option<&StructuredAnswer>, a| match best {
                Some(b) if b.confidence >= a.confidence => Some(b),
                _ => Some(a),
            })
    }

    /// Consensus level of the round, `Deadlock` if none was computed
    pub fn level(&self) -> ConsensusLevel {
        self.consensus
            .as_ref()
            .map(|c| c.level)
            .unwrap_or(ConsensusLevel::Deadlock)
    }
}

/// Lifecycle of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebateStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Timeout,
}

impl DebateStatus {
    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }
}

impl fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// The outcome of a debate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateResult {
    /// Unique ID
    pub debate_id: Uuid,
    /// The question under debate
    pub question: String,
    /// Completed rounds, ordered by round number
    pub rounds: Vec<DebateRound>,
    /// The answer the debate settled on
    pub final_answer: String,
    /// Confidence in the final answer (0 - 100)
    pub final_confidence: f64,
    /// Consensus level of the last round
    pub consensus_level: ConsensusLevel,
    /// Answers that disagreed with the final answer in the last round
    pub dissenting_views: Vec<StructuredAnswer>,
    pub status: DebateStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Sum of the LLM cost of every agent call
    pub total_cost: f64,
    pub error_message: Option<String>,
}

impl DebateResult {
    /// Create a pending debate
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            debate_id: Uuid::new_v4(),
            question: question.into(),
            rounds: Vec::new(),
            final_answer: String::new(),
            final_confidence: 0.0,
            consensus_level: ConsensusLevel::Deadlock,
            dissenting_views: Vec::new(),
            status: DebateStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            total_cost: 0.0,
            error_message: None,
        }
    }

    /// Move from `Pending` to `InProgress`
    pub fn begin(&mut self) -> Result<(), StateError> {
        self.ensure_open()?;
        self.status = DebateStatus::InProgress;
        self.started_at = Utc::now();
        Ok(())
    }

    /// Append a completed round
    pub fn record_round(&mut self, round: DebateRound) -> Result<(), StateError> {
        self.ensure_open()?;
        self.rounds.push(round);
        Ok(())
    }

    /// Add the cost of one LLM call
    pub fn add_cost(&mut self, cost: f64) -> Result<(), StateError> {
        self.ensure_open()?;
        self.total_cost += cost;
        Ok(())
    }

    /// Set the final answer fields without changing the status
    pub fn set_outcome(
        &mut self,
        final_answer: impl Into<String>,
        final_confidence: f64,
        level: ConsensusLevel,
        dissenting: Vec<StructuredAnswer>,
    ) -> Result<(), StateError> {
        self.ensure_open()?;
        self.final_answer = final_answer.into();
        self.final_confidence = final_confidence.clamp(0.0, 100.0);
        self.consensus_level = level;
        self.dissenting_views = dissenting;
        Ok(())
    }

    /// Mark the debate as completed
    pub fn complete(&mut self) -> Result<(), StateError> {
        self.finish(DebateStatus::Completed, None)
    }

    /// Mark the debate as failed
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StateError> {
        self.finish(DebateStatus::Failed, Some(message.into()))
    }

    /// Mark the debate as timed out
    pub fn time_out(&mut self, message: impl Into<String>) -> Result<(), StateError> {
        self.finish(DebateStatus::Timeout, Some(message.into()))
    }

    fn finish(&mut self, status: DebateStatus, message: Option<String>) -> Result<(), StateError> {
        self.ensure_open()?;
        self.status = status;
        self.error_message = message;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if self.status.is_terminal() {
            Err(StateError::DebateTerminal(self.debate_id))
        } else {
            Ok(())
        }
    }

    /// Number of completed rounds
    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// The most recent round
    pub fn last_round(&self) -> Option<&DebateRound> {
        self.rounds.last()
    }

    /// Whether the debate reached a final status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock duration, if the debate finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(n: u32, confidences: &[i64]) -> DebateRound {
        DebateRound {
            round_number: n,
            answers: confidences
                .iter()
                .enumerate()
                .map(|(i, c)| StructuredAnswer::new(format!("agent{}", i), "mock", "yes", *c))
                .collect(),
            consensus: None,
            started_at: Utc::now(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_debate_lifecycle() {
        let mut debate = DebateResult::new("Should we expand to Europe?");
        assert_eq!(debate.status, DebateStatus::Pending);

        debate.begin().unwrap();
        assert_eq!(debate.status, DebateStatus::InProgress);

        debate.record_round(round(0, &[80, 90])).unwrap();
        debate.add_cost(0.25).unwrap();
        debate
            .set_outcome("yes", 85.0, ConsensusLevel::Strong, Vec::new())
            .unwrap();
        debate.complete().unwrap();

        assert!(debate.is_terminal());
        assert_eq!(debate.total_rounds(), 1);
        assert!(debate.completed_at.is_some());
        assert!(debate.duration_ms().is_some());
    }

    #[test]
    fn test_terminal_debate_is_immutable() {
        let mut debate = DebateResult::new("q");
        debate.begin().unwrap();
        debate.fail("no rounds completed").unwrap();

        assert!(matches!(
            debate.record_round(round(0, &[50])),
            Err(StateError::DebateTerminal(_))
        ));
        assert!(debate.complete().is_err());
        assert!(debate.add_cost(1.0).is_err());
        assert_eq!(debate.status, DebateStatus::Failed);
        assert_eq!(debate.error_message.as_deref(), Some("no rounds completed"));
        assert!(debate.rounds.is_empty());
    }

    #[test]
    fn test_highest_confidence_answer_prefers_first_on_tie() {
        let r = round(0, &[70, 90, 90]);
        let best = r.highest_confidence_answer().unwrap();
        assert_eq!(best.agent_name, "agent1");
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&DebateStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let json = serde_json::to_string(&ConsensusLevel::Deadlock).unwrap();
        assert_eq!(json, "\"DEADLOCK\"");
    }
}
