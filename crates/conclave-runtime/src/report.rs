//! Recommendations and markdown reports for validation runs

use std::fmt::{self, Write as _};

use conclave_core::{ConsensusLevel, DebateResult, Hypothesis, HypothesisStatus};

use crate::validator::HypothesisValidationResult;

/// Actionable next step for a verdict
pub fn recommendation(status: HypothesisStatus, score: f64, debate: &DebateResult) -> String {
    let dissent = debate.dissenting_views.len();
    match status {
        HypothesisStatus::Validated if score >= 85.0 => format!(
            "Strongly supported (score {:.0}). Move to a real-world test against the success criteria.",
            score
        ),
        HypothesisStatus::Validated if dissent > 0 => format!(
            "Supported (score {:.0}). Proceed, but address the {} dissenting view(s) first.",
            score, dissent
        ),
        HypothesisStatus::Validated => format!(
            "Supported (score {:.0}). Proceed and track the success criteria.",
            score
        ),
        HypothesisStatus::Invalidated => format!(
            "Rejected (score {:.0}). Pivot or drop this hypothesis; review the contradicting evidence before reinvesting.",
            score
        ),
        HypothesisStatus::NeedsMoreData if debate.consensus_level == ConsensusLevel::Deadlock => {
            "Agents deadlocked. Gather primary data (interviews, experiments) aimed at the disagreement, then revalidate."
                .to_string()
        }
        HypothesisStatus::NeedsMoreData => format!(
            "Inconclusive (score {:.0}). Run a cheap experiment against the success criteria and revalidate with its results.",
            score
        ),
        HypothesisStatus::Untested => format!(
            "Validation did not finish ({}). Retry once the providers are reachable.",
            debate
                .error_message
                .as_deref()
                .unwrap_or("no verdict")
        ),
        HypothesisStatus::Validating => "Validation in progress.".to_string(),
        HypothesisStatus::Pivoted => "Hypothesis was pivoted; validate its replacement instead.".to_string(),
    }
}

/// Markdown report of one validation run
pub struct ValidationReport<'a> {
    pub hypothesis: &'a Hypothesis,
    pub result: &'a HypothesisValidationResult,
}

impl<'a> ValidationReport<'a> {
    pub fn new(hypothesis: &'a Hypothesis, result: &'a HypothesisValidationResult) -> Self {
        Self { hypothesis, result }
    }

    pub fn to_markdown(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.hypothesis;
        let r = self.result;
        let debate = &r.debate;

        writeln!(f, "# Hypothesis validation report")?;
        writeln!(f)?;
        writeln!(f, "**Hypothesis:** {}", h.statement())?;
        writeln!(f, "**Category:** {}", h.category())?;
        writeln!(f, "**Priority:** {:.1}", h.priority_score())?;
        writeln!(f)?;

        writeln!(f, "## Verdict")?;
        writeln!(f)?;
        writeln!(f, "- Status: **{}**", r.status)?;
        writeln!(f, "- Score: {:.1}", r.validation_score)?;
        writeln!(f, "- Consensus: {}", r.consensus_level)?;
        writeln!(f, "- Final answer: {}", r.final_answer)?;
        writeln!(f, "- Debate: {} ({} rounds, ${:.4})", debate.status, debate.total_rounds(), debate.total_cost)?;
        if let Some(error) = &r.error {
            writeln!(f, "- Error: {}", error)?;
        }
        writeln!(f)?;
        writeln!(f, "**Recommendation:** {}", r.recommendation)?;
        writeln!(f)?;

        if !debate.rounds.is_empty() {
            writeln!(f, "## Rounds")?;
            writeln!(f)?;
            writeln!(f, "| Round | Answers | Consensus | Agreement | Weighted confidence |")?;
            writeln!(f, "|---|---|---|---|---|")?;
            for round in &debate.rounds {
                let (agreement, confidence) = round
                    .consensus
                    .as_ref()
                    .map(|c| (c.agreement_score, c.weighted_confidence))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "| {} | {} | {} | {:.0}% | {:.1} |",
                    round.round_number + 1,
                    round.answers.len(),
                    round.level(),
                    agreement * 100.0,
                    confidence
                )?;
            }
            writeln!(f)?;
        }

        if !r.evidence.is_empty() {
            writeln!(f, "## Evidence")?;
            writeln!(f)?;
            for e in &r.evidence {
                let mark = if e.supports { "+" } else { "-" };
                writeln!(f, "- [{}] {} ({}, {}%)", mark, e.content, e.collected_by, e.confidence)?;
            }
            writeln!(f)?;
        }

        if !debate.dissenting_views.is_empty() {
            writeln!(f, "## Dissent")?;
            writeln!(f)?;
            for view in &debate.dissenting_views {
                let mut line = format!("- **{}** ({}%): {}", view.agent_name, view.confidence, view.answer);
                if !view.reasoning.is_empty() {
                    let _ = write!(line, " - {}", view.reasoning);
                }
                writeln!(f, "{}", line)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debate(level: ConsensusLevel) -> DebateResult {
        let mut debate = DebateResult::new("q");
        debate.consensus_level = level;
        debate
    }

    #[test]
    fn test_recommendations_follow_verdict() {
        let strong = debate(ConsensusLevel::Strong);
        assert!(recommendation(HypothesisStatus::Validated, 90.0, &strong).starts_with("Strongly supported"));
        assert!(recommendation(HypothesisStatus::Invalidated, 90.0, &strong).starts_with("Rejected"));

        let deadlock = debate(ConsensusLevel::Deadlock);
        assert!(recommendation(HypothesisStatus::NeedsMoreData, 35.0, &deadlock).contains("deadlocked"));

        let mut failed = debate(ConsensusLevel::Deadlock);
        failed.error_message = Some("round 0 timed out after 10ms".into());
        assert!(recommendation(HypothesisStatus::Untested, 0.0, &failed).contains("timed out"));
    }
}
