//! Hypotheses under validation
//!
//! A [`Hypothesis`] is a long-lived, shared entity. Its priority score and
//! evidence counters are derived fields, so the inputs are private and only
//! change through methods that keep the derived values in step.
//!
//! Validation status doubles as a lock: [`Hypothesis::begin_validation`]
//! refuses to start while another validation is running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::debate::DebateResult;
use crate::error::StateError;
use crate::evidence::Evidence;

/// Handle to a shared hypothesis
pub type HypothesisHandle = Arc<Mutex<Hypothesis>>;

/// Business area a hypothesis belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisCategory {
    Market,
    Customer,
    Problem,
    Solution,
    Pricing,
    Channel,
    Technical,
    Competitive,
    Regulatory,
    Financial,
}

impl HypothesisCategory {
    pub const ALL: [HypothesisCategory; 10] = [
        Self::Market,
        Self::Customer,
        Self::Problem,
        Self::Solution,
        Self::Pricing,
        Self::Channel,
        Self::Technical,
        Self::Competitive,
        Self::Regulatory,
        Self::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Customer => "customer",
            Self::Problem => "problem",
            Self::Solution => "solution",
            Self::Pricing => "pricing",
            Self::Channel => "channel",
            Self::Technical => "technical",
            Self::Competitive => "competitive",
            Self::Regulatory => "regulatory",
            Self::Financial => "financial",
        }
    }
}

impl fmt::Display for HypothesisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HypothesisCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown hypothesis category: {}", s))
    }
}

/// Three-step rating shared by impact and risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    fn weight(&self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown level: {}", other)),
        }
    }
}

/// How cheaply a hypothesis can be tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Testability {
    Easy,
    Medium,
    Hard,
}

impl Testability {
    fn weight(&self) -> f64 {
        match self {
            Self::Easy => 3.0,
            Self::Medium => 2.0,
            Self::Hard => 1.0,
        }
    }
}

impl std::str::FromStr for Testability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown testability: {}", other)),
        }
    }
}

/// Validation status of a hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HypothesisStatus {
    Untested,
    Validating,
    Validated,
    Invalidated,
    NeedsMoreData,
    Pivoted,
}

impl fmt::Display for HypothesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Untested => "untested",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::Invalidated => "invalidated",
            Self::NeedsMoreData => "needs_more_data",
            Self::Pivoted => "pivoted",
        };
        f.write_str(s)
    }
}

const IMPACT_WEIGHT: f64 = 0.4;
const RISK_WEIGHT: f64 = 0.35;
const TESTABILITY_WEIGHT: f64 = 0.25;

/// Priority (0 - 100) from impact, risk and testability
pub fn priority_score(impact: Level, risk: Level, testability: Testability) -> f64 {
    let raw = impact.weight() * IMPACT_WEIGHT
        + risk.weight() * RISK_WEIGHT
        + testability.weight() * TESTABILITY_WEIGHT;
    // max raw is 3.0
    raw / 3.0 * 100.0
}

/// A falsifiable statement subjected to debate-based validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredHypothesis")]
pub struct Hypothesis {
    id: Uuid,
    statement: String,
    description: Option<String>,
    category: HypothesisCategory,
    impact: Level,
    risk: Level,
    testability: Testability,
    status: HypothesisStatus,
    success_criteria: Vec<String>,
    evidence: Vec<Evidence>,
    supporting_count: usize,
    contradicting_count: usize,
    priority_score: f64,
    validation_score: Option<f64>,
    debate_history: Vec<DebateResult>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a hypothesis, without the derived fields
#[derive(Deserialize)]
struct StoredHypothesis {
    id: Uuid,
    statement: String,
    #[serde(default)]
    description: Option<String>,
    category: HypothesisCategory,
    impact: Level,
    risk: Level,
    testability: Testability,
    status: HypothesisStatus,
    #[serde(default)]
    success_criteria: Vec<String>,
    #[serde(default)]
    evidence: Vec<Evidence>,
    #[serde(default)]
    validation_score: Option<f64>,
    #[serde(default)]
    debate_history: Vec<DebateResult>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoredHypothesis> for Hypothesis {
    fn from(stored: StoredHypothesis) -> Self {
        let supporting_count = stored.evidence.iter().filter(|e| e.supports).count();
        Self {
            contradicting_count: stored.evidence.len() - supporting_count,
            supporting_count,
            priority_score: priority_score(stored.impact, stored.risk, stored.testability),
            id: stored.id,
            statement: stored.statement,
            description: stored.description,
            category: stored.category,
            impact: stored.impact,
            risk: stored.risk,
            testability: stored.testability,
            status: stored.status,
            success_criteria: stored.success_criteria,
            evidence: stored.evidence,
            validation_score: stored.validation_score,
            debate_history: stored.debate_history,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

impl Hypothesis {
    /// Create an untested hypothesis with medium impact, risk and testability
    pub fn new(statement: impl Into<String>, category: HypothesisCategory) -> Self {
        let now = Utc::now();
        let mut hypothesis = Self {
            id: Uuid::new_v4(),
            statement: statement.into(),
            description: None,
            category,
            impact: Level::Medium,
            risk: Level::Medium,
            testability: Testability::Medium,
            status: HypothesisStatus::Untested,
            success_criteria: Vec::new(),
            evidence: Vec::new(),
            supporting_count: 0,
            contradicting_count: 0,
            priority_score: 0.0,
            validation_score: None,
            debate_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        hypothesis.recompute_priority();
        hypothesis
    }

    /// Builder: set impact, risk and testability together
    pub fn with_ratings(mut self, impact: Level, risk: Level, testability: Testability) -> Self {
        self.impact = impact;
        self.risk = risk;
        self.testability = testability;
        self.recompute_priority();
        self
    }

    /// Builder: set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: add a success criterion
    pub fn with_success_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.success_criteria.push(criterion.into());
        self
    }

    /// Wrap in a shared handle
    pub fn into_handle(self) -> HypothesisHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> HypothesisCategory {
        self.category
    }

    pub fn impact(&self) -> Level {
        self.impact
    }

    pub fn risk(&self) -> Level {
        self.risk
    }

    pub fn testability(&self) -> Testability {
        self.testability
    }

    pub fn status(&self) -> HypothesisStatus {
        self.status
    }

    pub fn success_criteria(&self) -> &[String] {
        &self.success_criteria
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn supporting_count(&self) -> usize {
        self.supporting_count
    }

    pub fn contradicting_count(&self) -> usize {
        self.contradicting_count
    }

    pub fn priority_score(&self) -> f64 {
        self.priority_score
    }

    pub fn validation_score(&self) -> Option<f64> {
        self.validation_score
    }

    pub fn debate_history(&self) -> &[DebateResult] {
        &self.debate_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_impact(&mut self, impact: Level) {
        self.impact = impact;
        self.recompute_priority();
    }

    pub fn set_risk(&mut self, risk: Level) {
        self.risk = risk;
        self.recompute_priority();
    }

    pub fn set_testability(&mut self, testability: Testability) {
        self.testability = testability;
        self.recompute_priority();
    }

    fn recompute_priority(&mut self) {
        self.priority_score = priority_score(self.impact, self.risk, self.testability);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append evidence, keeping the counters consistent
    pub fn add_evidence(&mut self, evidence: Evidence) {
        if evidence.supports {
            self.supporting_count += 1;
        } else {
            self.contradicting_count += 1;
        }
        self.evidence.push(evidence);
        self.touch();
    }

    /// Enter `Validating`, rejecting a second concurrent validation
    pub fn begin_validation(&mut self) -> Result<(), StateError> {
        if self.status == HypothesisStatus::Validating {
            return Err(StateError::AlreadyValidating(self.id));
        }
        self.status = HypothesisStatus::Validating;
        self.touch();
        Ok(())
    }

    /// Leave `Validating` with a verdict
    pub fn complete_validation(
        &mut self,
        verdict: HypothesisStatus,
        score: f64,
        new_evidence: Vec<Evidence>,
        debate: DebateResult,
    ) -> Result<(), StateError> {
        self.ensure_validating()?;
        for item in new_evidence {
            self.add_evidence(item);
        }
        self.status = verdict;
        self.validation_score = Some(score);
        self.debate_history.push(debate);
        self.touch();
        Ok(())
    }

    /// Revert a failed validation to `Untested`, keeping the partial debate
    pub fn abort_validation(&mut self, debate: Option<DebateResult>) -> Result<(), StateError> {
        self.ensure_validating()?;
        self.status = HypothesisStatus::Untested;
        if let Some(debate) = debate {
            self.debate_history.push(debate);
        }
        self.touch();
        Ok(())
    }

    /// Record that the team pivoted away from this hypothesis
    pub fn mark_pivoted(&mut self) -> Result<(), StateError> {
        if self.status == HypothesisStatus::Validating {
            return Err(StateError::AlreadyValidating(self.id));
        }
        self.status = HypothesisStatus::Pivoted;
        self.touch();
        Ok(())
    }

    fn ensure_validating(&self) -> Result<(), StateError> {
        if self.status != HypothesisStatus::Validating {
            return Err(StateError::NotValidating {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}
