//! Hypothesis validation through debate
//!
//! A validation runs one debate about a hypothesis, converts the outcome
//! into a score and a verdict, and writes the verdict back onto the shared
//! hypothesis. The hypothesis lock is held only to enter `Validating` and to
//! record the result, never while agents are debating.
//!
//! A validation that is dropped before it records a result (a caller-side
//! timeout, a losing `select!` branch) reverts the hypothesis to `Untested`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use conclave_core::{
    ConsensusLevel, DebateResult, DebateStatus, Evidence, Hypothesis, HypothesisHandle,
    HypothesisStatus,
};
use conclave_debate::{emit_quietly, DebateEvent};

use crate::orchestrator::DebateOrchestrator;
use crate::report::recommendation;

/// Phrases in a final answer that count as rejecting the hypothesis
pub const REJECTION_KEYWORDS: &[&str] = &[
    "invalid",
    "rejected",
    "unlikely",
    "not supported",
    "unsupported",
    "disproven",
    "refuted",
    "not viable",
    "does not hold",
    "no evidence",
];

/// Thresholds for turning a debate into a verdict
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Score at or above which a hypothesis can be validated
    pub validation_threshold: f64,
    /// Score at or below which a rejecting answer invalidates
    pub invalidation_threshold: f64,
    /// Minimum agent confidence for its evidence to count as supporting
    pub support_threshold: u8,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            validation_threshold: 70.0,
            invalidation_threshold: 40.0,
            support_threshold: 60,
        }
    }
}

/// Errors that prevent a validation from starting
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Hypothesis {0} is already being validated")]
    AlreadyValidating(Uuid),
}

/// Whether the validation produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Completed,
    Failed,
}

/// The outcome of one validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisValidationResult {
    pub validation_id: Uuid,
    pub hypothesis_id: Uuid,
    pub outcome: ValidationOutcome,
    /// Hypothesis status after the run
    pub status: HypothesisStatus,
    /// Score (0 - 100), 0 when the run failed
    pub validation_score: f64,
    pub consensus_level: ConsensusLevel,
    pub final_answer: String,
    /// Evidence appended to the hypothesis by this run
    pub evidence: Vec<Evidence>,
    /// The debate, partial if the run failed
    pub debate: DebateResult,
    pub recommendation: String,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl HypothesisValidationResult {
    pub fn is_success(&self) -> bool {
        self.outcome == ValidationOutcome::Completed
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

/// Reverts a hypothesis stuck in `Validating` unless disarmed
struct ValidatingGuard {
    handle: HypothesisHandle,
    validation_id: Uuid,
    armed: bool,
}

impl ValidatingGuard {
    fn new(handle: &HypothesisHandle, validation_id: Uuid) -> Self {
        Self {
            handle: handle.clone(),
            validation_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

fn revert_abandoned(hypothesis: &mut Hypothesis, validation_id: Uuid) {
    if hypothesis.status() != HypothesisStatus::Validating {
        return;
    }
    match hypothesis.abort_validation(None) {
        Ok(()) => tracing::warn!(
            %validation_id,
            hypothesis_id = %hypothesis.id(),
            "Validation abandoned, hypothesis reverted"
        ),
        Err(e) => tracing::error!(%validation_id, error = %e, "Could not revert hypothesis"),
    }
}

impl Drop for ValidatingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let validation_id = self.validation_id;
        if let Ok(mut hypothesis) = self.handle.try_lock() {
            revert_abandoned(&mut hypothesis, validation_id);
            return;
        }
        // Someone else holds the lock; revert once it is released
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = self.handle.clone();
                runtime.spawn(async move {
                    revert_abandoned(&mut *handle.lock().await, validation_id);
                });
            }
            Err(_) => tracing::error!(
                %validation_id,
                "Validation abandoned outside a runtime, hypothesis left validating"
            ),
        }
    }
}

/// Validates hypotheses by debating them
pub struct HypothesisValidator {
    /// Verdict thresholds
    pub config: ValidatorConfig,
    orchestrator: DebateOrchestrator,
}

impl HypothesisValidator {
    /// Create a validator running its debates on `orchestrator`
    pub fn new(orchestrator: DebateOrchestrator, config: ValidatorConfig) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &DebateOrchestrator {
        &self.orchestrator
    }

    /// Validate a hypothesis in place
    ///
    /// Returns `Err` only when the hypothesis is already being validated, in
    /// which case nothing is changed. Debate failures come back as a result
    /// with [`ValidationOutcome::Failed`] and the hypothesis reverted to
    /// `Untested`.
    pub async fn validate(
        &self,
        handle: &HypothesisHandle,
        additional_context: Option<&str>,
    ) -> Result<HypothesisValidationResult, ValidationError> {
        let validation_id = Uuid::new_v4();
        let started_at = Utc::now();

        let snapshot = {
            let mut hypothesis = handle.lock().await;
            if hypothesis.begin_validation().is_err() {
                tracing::warn!(hypothesis_id = %hypothesis.id(), "Validation already in progress");
                return Err(ValidationError::AlreadyValidating(hypothesis.id()));
            }
            hypothesis.clone()
        };
        let guard = ValidatingGuard::new(handle, validation_id);
        let hypothesis_id = snapshot.id();

        tracing::info!(
            %validation_id,
            %hypothesis_id,
            category = %snapshot.category(),
            "Validation started"
        );

        let question = validation_question(&snapshot, additional_context);
        let debate = self.orchestrator.debate(&question, None).await;

        let result = if debate.status == DebateStatus::Completed {
            self.record_verdict(handle, validation_id, started_at, debate)
                .await
        } else {
            let message = debate
                .error_message
                .clone()
                .unwrap_or_else(|| format!("debate ended with status {}", debate.status));
            self.record_failure(handle, validation_id, started_at, debate, message)
                .await
        };
        guard.disarm();

        metrics::counter!("conclave_validations_total", "status" => result.status.to_string())
            .increment(1);
        if result.is_success() {
            metrics::histogram!("conclave_validation_score").record(result.validation_score);
        }

        let event = if result.is_success() {
            DebateEvent::ValidationCompleted {
                validation_id,
                hypothesis_id,
                debate_id: result.debate.debate_id,
                status: result.status,
                score: result.validation_score,
                consensus_level: result.consensus_level,
                duration_ms: result.duration_ms(),
                total_cost: result.debate.total_cost,
            }
        } else {
            DebateEvent::ValidationFailed {
                validation_id,
                hypothesis_id,
                debate_id: Some(result.debate.debate_id),
                error: result.error.clone().unwrap_or_default(),
                duration_ms: result.duration_ms(),
            }
        };
        emit_quietly(self.orchestrator.events().as_ref(), event).await;

        Ok(result)
    }

    async fn record_verdict(
        &self,
        handle: &HypothesisHandle,
        validation_id: Uuid,
        started_at: DateTime<Utc>,
        debate: DebateResult,
    ) -> HypothesisValidationResult {
        let score = validation_score(debate.final_confidence, debate.consensus_level);
        let status = derive_status(&debate.final_answer, score, &self.config);
        let evidence = extract_evidence(&debate, self.config.support_threshold);

        let mut hypothesis = handle.lock().await;
        let hypothesis_id = hypothesis.id();
        if let Err(e) =
            hypothesis.complete_validation(status, score, evidence.clone(), debate.clone())
        {
            tracing::error!(%validation_id, error = %e, "Could not record verdict");
            let current = hypothesis.status();
            drop(hypothesis);
            return failed_result(
                (hypothesis_id, current),
                validation_id,
                started_at,
                debate,
                e.to_string(),
            );
        }
        drop(hypothesis);

        tracing::info!(
            %validation_id,
            %hypothesis_id,
            status = %status,
            score,
            level = %debate.consensus_level,
            evidence = evidence.len(),
            "Validation completed"
        );

        HypothesisValidationResult {
            validation_id,
            hypothesis_id,
            outcome: ValidationOutcome::Completed,
            status,
            validation_score: score,
            consensus_level: debate.consensus_level,
            final_answer: debate.final_answer.clone(),
            evidence,
            recommendation: recommendation(status, score, &debate),
            debate,
            error: None,
            started_at,
            completed_at: Utc::now(),
        }
    }

    async fn record_failure(
        &self,
        handle: &HypothesisHandle,
        validation_id: Uuid,
        started_at: DateTime<Utc>,
        debate: DebateResult,
        message: String,
    ) -> HypothesisValidationResult {
        let state = {
            let mut hypothesis = handle.lock().await;
            if let Err(e) = hypothesis.abort_validation(Some(debate.clone())) {
                tracing::error!(%validation_id, error = %e, "Could not revert hypothesis");
            }
            (hypothesis.id(), hypothesis.status())
        };
        tracing::warn!(
            %validation_id,
            debate_id = %debate.debate_id,
            status = %debate.status,
            error = %message,
            "Validation failed"
        );
        failed_result(state, validation_id, started_at, debate, message)
    }
}

/// Result for a run that produced no verdict; `state` is the hypothesis id and status
fn failed_result(
    (hypothesis_id, status): (Uuid, HypothesisStatus),
    validation_id: Uuid,
    started_at: DateTime<Utc>,
    debate: DebateResult,
    message: String,
) -> HypothesisValidationResult {
    HypothesisValidationResult {
        validation_id,
        hypothesis_id,
        outcome: ValidationOutcome::Failed,
        status,
        validation_score: 0.0,
        consensus_level: debate.consensus_level,
        final_answer: debate.final_answer.clone(),
        evidence: Vec::new(),
        recommendation: recommendation(HypothesisStatus::Untested, 0.0, &debate),
        debate,
        error: Some(message),
        started_at,
        completed_at: Utc::now(),
    }
}

/// Score discount for weaker agreement
pub fn consensus_multiplier(level: ConsensusLevel) -> f64 {
    match level {
        ConsensusLevel::Strong => 1.0,
        ConsensusLevel::Moderate => 0.9,
        ConsensusLevel::Weak => 0.75,
        ConsensusLevel::Deadlock => 0.5,
    }
}

/// Final confidence discounted by the consensus level
pub fn validation_score(final_confidence: f64, level: ConsensusLevel) -> f64 {
    (final_confidence * consensus_multiplier(level)).clamp(0.0, 100.0)
}

/// Whether an answer rejects the hypothesis
pub fn is_rejection(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    REJECTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Verdict from the final answer and the score
pub fn derive_status(final_answer: &str, score: f64, config: &ValidatorConfig) -> HypothesisStatus {
    let rejected = is_rejection(final_answer);
    if score >= config.validation_threshold {
        if rejected {
            HypothesisStatus::Invalidated
        } else {
            HypothesisStatus::Validated
        }
    } else if score <= config.invalidation_threshold && rejected {
        HypothesisStatus::Invalidated
    } else {
        HypothesisStatus::NeedsMoreData
    }
}

/// One evidence record per evidence item in the debate's final round
pub fn extract_evidence(debate: &DebateResult, support_threshold: u8) -> Vec<Evidence> {
    let source = format!("debate:{}", debate.debate_id);
    debate
        .last_round()
        .map(|round| {
            round
                .answers
                .iter()
                .flat_map(|answer| {
                    let source = &source;
                    answer.evidence.iter().map(move |item| {
                        Evidence::new(
                            source.clone(),
                            item.clone(),
                            answer.confidence >= support_threshold,
                            i64::from(answer.confidence),
                            answer.agent_name.clone(),
                        )
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The debate question for a hypothesis
pub fn validation_question(hypothesis: &Hypothesis, additional_context: Option<&str>) -> String {
    let mut question = format!(
        "Evaluate this {} hypothesis and decide whether it holds.\n\nHypothesis: {}\n",
        hypothesis.category(),
        hypothesis.statement()
    );

    if let Some(description) = hypothesis.description() {
        question.push_str(&format!("Description: {}\n", description));
    }

    if !hypothesis.success_criteria().is_empty() {
        question.push_str("\nSuccess criteria:\n");
        for criterion in hypothesis.success_criteria() {
            question.push_str(&format!("- {}\n", criterion));
        }
    }

    let (supporting, contradicting): (Vec<&Evidence>, Vec<&Evidence>) =
        hypothesis.evidence().iter().partition(|e| e.supports);
    if !supporting.is_empty() {
        question.push_str("\nExisting supporting evidence:\n");
        for e in supporting {
            question.push_str(&format!("- {} ({})\n", e.content, e.source));
        }
    }
    if !contradicting.is_empty() {
        question.push_str("\nExisting contradicting evidence:\n");
        for e in contradicting {
            question.push_str(&format!("- {} ({})\n", e.content, e.source));
        }
    }

    if let Some(ctx) = additional_context.map(str::trim).filter(|c| !c.is_empty()) {
        question.push_str(&format!("\nAdditional context:\n{}\n", ctx));
    }

    question.push_str(
        "\nAnswer \"validated\" if the hypothesis holds or \"invalid\" if it does not, \
         and list the evidence behind your position.",
    );
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::{DebateRound, HypothesisCategory, StructuredAnswer};

    #[test]
    fn test_multipliers() {
        assert_eq!(validation_score(90.0, ConsensusLevel::Strong), 90.0);
        assert_eq!(validation_score(80.0, ConsensusLevel::Moderate), 72.0);
        assert_eq!(validation_score(80.0, ConsensusLevel::Weak), 60.0);
        assert_eq!(validation_score(80.0, ConsensusLevel::Deadlock), 40.0);
    }

    #[test]
    fn test_derive_status() {
        let config = ValidatorConfig::default();
        assert_eq!(derive_status("Supported", 85.0, &config), HypothesisStatus::Validated);
        assert_eq!(
            derive_status("The hypothesis is invalid", 75.0, &config),
            HypothesisStatus::Invalidated
        );
        assert_eq!(derive_status("Unlikely", 30.0, &config), HypothesisStatus::Invalidated);
        assert_eq!(derive_status("Maybe", 30.0, &config), HypothesisStatus::NeedsMoreData);
        assert_eq!(derive_status("Supported", 55.0, &config), HypothesisStatus::NeedsMoreData);
        assert_eq!(derive_status("Rejected", 55.0, &config), HypothesisStatus::NeedsMoreData);
        assert_eq!(derive_status("Supported", 70.0, &config), HypothesisStatus::Validated);
    }

    #[test]
    fn test_extract_evidence_uses_final_round_only() {
        let mut debate = DebateResult::new("q");
        let round = |n: u32, text: &str| DebateRound {
            round_number: n,
            answers: vec![
                StructuredAnswer::new("analyst", "m", "yes", 80).with_evidence([text, "second"]),
                StructuredAnswer::new("skeptic", "m", "no", 40).with_evidence(["doubt"]),
            ],
            consensus: None,
            started_at: Utc::now(),
            completed_at: Utc::now(),
        };
        debate.record_round(round(0, "stale")).unwrap();
        debate.record_round(round(1, "fresh")).unwrap();

        let evidence = extract_evidence(&debate, 60);
        assert_eq!(evidence.len(), 3);
        assert!(evidence.iter().all(|e| e.content != "stale"));
        assert!(evidence[0].supports);
        assert_eq!(evidence[0].collected_by, "analyst");
        assert_eq!(evidence[0].source, format!("debate:{}", debate.debate_id));
        assert!(!evidence[2].supports);
        assert_eq!(evidence[2].confidence, 40);
    }

    #[test]
    fn test_question_lists_inputs() {
        let mut hypothesis = Hypothesis::new("SMBs will pay $50/month", HypothesisCategory::Pricing)
            .with_description("Self-serve tier")
            .with_success_criterion("10 of 50 trials convert");
        hypothesis.add_evidence(Evidence::new("interview", "3 of 5 said yes", true, 70, "pm"));
        hypothesis.add_evidence(Evidence::new("survey", "price too high", false, 60, "pm"));

        let question = validation_question(&hypothesis, Some("EU only"));
        assert!(question.contains("pricing hypothesis"));
        assert!(question.contains("Hypothesis: SMBs will pay $50/month"));
        assert!(question.contains("Description: Self-serve tier"));
        assert!(question.contains("- 10 of 50 trials convert"));
        assert!(question.contains("Existing supporting evidence:\n- 3 of 5 said yes (interview)"));
        assert!(question.contains("Existing contradicting evidence:\n- price too high (survey)"));
        assert!(question.contains("Additional context:\nEU only"));
    }
}
