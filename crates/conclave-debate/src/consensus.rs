//! Confidence-weighted consensus detection
//!
//! Answers are compared lexically after normalization; there is no semantic
//! matching. Each normalized answer forms a group whose weight is the sum of
//! its members' confidences, and the heaviest group is the majority.
//!
//! Note that the agreement score is a headcount ratio even though the
//! majority is chosen by weight, so a single very confident agent can form a
//! majority with a low agreement score.

use serde::{Deserialize, Serialize};

use conclave_core::{ConsensusLevel, ConsensusResult, StructuredAnswer};

/// Filler openings removed before answers are compared
pub const FILLER_PREFIXES: &[&str] = &[
    "i believe that ",
    "i believe ",
    "i think that ",
    "i think ",
    "in my opinion, ",
    "in my opinion ",
    "in my view, ",
    "my answer is ",
    "the answer is ",
    "i would say ",
    "i agree that ",
    "i agree, ",
    "i agree ",
    "overall, ",
    "yes, ",
];

/// Thresholds for classifying agreement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum share of agents in the majority for Strong/Moderate
    pub agreement_threshold: f64,
    /// Minimum weighted confidence for Strong
    pub strong_confidence: f64,
    /// Minimum weighted confidence for Moderate
    pub moderate_confidence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            agreement_threshold: 0.7,
            strong_confidence: 80.0,
            moderate_confidence: 60.0,
        }
    }
}

/// Detects agreement among one round's answers
#[derive(Debug, Clone, Default)]
pub struct ConsensusDetector {
    pub config: ConsensusConfig,
}

struct Group<'a> {
    members: Vec<&'a StructuredAnswer>,
    weight: f64,
}

impl ConsensusDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Classify a round's answers
    pub fn detect(&self, answers: &[StructuredAnswer]) -> ConsensusResult {
        if answers.is_empty() {
            return ConsensusResult::empty();
        }

        // Groups keep first-seen order so ties resolve to the earliest answer
        let mut keys: Vec<String> = Vec::new();
        let mut groups: Vec<Group<'_>> = Vec::new();
        for answer in answers {
            let key = normalize_answer(&answer.answer);
            match keys.iter().position(|k| *k == key) {
                Some(idx) => {
                    groups[idx].members.push(answer);
                    groups[idx].weight += answer.confidence_fraction();
                }
                None => {
                    keys.push(key);
                    groups.push(Group {
                        members: vec![answer],
                        weight: answer.confidence_fraction(),
                    });
                }
            }
        }

        let mut majority_idx = 0;
        for (idx, group) in groups.iter().enumerate() {
            if group.weight > groups[majority_idx].weight {
                majority_idx = idx;
            }
        }
        let majority = &groups[majority_idx];

        let total_agents = answers.len();
        let majority_count = majority.members.len();
        let agreement_score = majority_count as f64 / total_agents as f64;
        let weighted_confidence = weighted_confidence(&majority.members);

        let majority_answer = majority
            .members
            .iter()
            .fold(None, |best: Option<&&StructuredAnswer>, a| match best {
                Some(b) if b.confidence >= a.confidence => Some(b),
                _ => Some(a),
            })
            .map(|a| a.answer.trim().to_string())
            .unwrap_or_default();

        let dissenting = groups
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != majority_idx)
            .flat_map(|(_, g)| g.members.iter().map(|a| (*a).clone()))
            .collect();

        let level = self.classify(total_agents, agreement_score, weighted_confidence);

        tracing::debug!(
            level = %level,
            agreement = agreement_score,
            weighted_confidence,
            groups = groups.len(),
            "Consensus detected"
        );

        ConsensusResult {
            level,
            agreement_score,
            weighted_confidence,
            majority_answer,
            majority_count,
            total_agents,
            dissenting,
        }
    }

    fn classify(&self, total_agents: usize, agreement: f64, confidence: f64) -> ConsensusLevel {
        let cfg = &self.config;
        if total_agents < 2 {
            ConsensusLevel::Weak
        } else if agreement >= cfg.agreement_threshold && confidence >= cfg.strong_confidence {
            ConsensusLevel::Strong
        } else if agreement >= cfg.agreement_threshold && confidence >= cfg.moderate_confidence {
            ConsensusLevel::Moderate
        } else if agreement > 0.5 {
            ConsensusLevel::Weak
        } else {
            ConsensusLevel::Deadlock
        }
    }

    /// Whether another round should run after `current_round` (zero-based)
    pub fn should_continue_debate(
        &self,
        result: &ConsensusResult,
        current_round: u32,
        max_rounds: u32,
    ) -> bool {
        should_continue_debate(result, current_round, max_rounds)
    }
}

/// Stop at the round cap or on strong consensus; keep going otherwise, deadlock included
pub fn should_continue_debate(result: &ConsensusResult, current_round: u32, max_rounds: u32) -> bool {
    if current_round >= max_rounds.saturating_sub(1) {
        return false;
    }
    result.level != ConsensusLevel::Strong
}

/// Lowercase, trim and strip filler openings
pub fn normalize_answer(answer: &str) -> String {
    let mut normalized = answer.trim().to_lowercase();
    loop {
        let stripped = FILLER_PREFIXES
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix))
            .map(|rest| rest.trim_start().to_string());
        match stripped {
            Some(rest) => normalized = rest,
            None => break,
        }
    }
    normalized
        .trim_end_matches(['.', '!'])
        .trim()
        .to_string()
}

/// Σc² / Σc over the given answers (0 when every confidence is 0)
fn weighted_confidence(members: &[&StructuredAnswer]) -> f64 {
    let (sum, sum_sq) = members.iter().fold((0.0, 0.0), |(s, sq), a| {
        let c = f64::from(a.confidence);
        (s + c, sq + c * c)
    });
    if sum > 0.0 {
        sum_sq / sum
    } else {
        0.0
    }
}

/// Plain mean confidence of a set of answers
pub fn average_confidence(answers: &[StructuredAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    answers.iter().map(|a| f64::from(a.confidence)).sum::<f64>() / answers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(agent: &str, text: &str, confidence: i64) -> StructuredAnswer {
        StructuredAnswer::new(agent, "mock", text, confidence)
    }

    #[test]
    fn test_normalize_strips_fillers() {
        assert_eq!(normalize_answer("  I believe Expand.  "), "expand");
        assert_eq!(normalize_answer("Yes, I think that we should expand"), "we should expand");
        assert_eq!(normalize_answer("In my opinion, NO!"), "no");
        assert_eq!(normalize_answer("Expand"), "expand");
    }

    #[test]
    fn test_negation_is_not_filler() {
        assert_eq!(normalize_answer("No, we should wait"), "no, we should wait");
        assert_ne!(
            normalize_answer("No, we should wait"),
            normalize_answer("Yes, we should wait")
        );

        let result = ConsensusDetector::default().detect(&[
            answer("a", "Yes, we should wait", 80),
            answer("b", "No, we should wait", 80),
        ]);
        assert_eq!(result.majority_count, 1);
        assert_eq!(result.dissenting.len(), 1);
    }

    #[test]
    fn test_unanimous_strong() {
        let detector = ConsensusDetector::default();
        let answers = vec![
            answer("a", "Yes, expand", 85),
            answer("b", "yes, expand", 90),
            answer("c", "YES, EXPAND", 80),
        ];
        let result = detector.detect(&answers);

        assert_eq!(result.level, ConsensusLevel::Strong);
        assert_eq!(result.agreement_score, 1.0);
        assert_eq!(result.majority_count, 3);
        assert_eq!(result.majority_answer, "yes, expand");
        assert!(result.dissenting.is_empty());
    }

    #[test]
    fn test_confidence_weighting_beats_headcount() {
        let detector = ConsensusDetector::default();
        let answers = vec![
            answer("a", "A", 40),
            answer("b", "A", 40),
            answer("c", "B", 95),
        ];
        let result = detector.detect(&answers);

        assert_eq!(result.majority_answer, "B");
        assert_eq!(result.majority_count, 1);
        assert!((result.weighted_confidence - 95.0).abs() < 1e-9);
        assert!((result.agreement_score - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.level, ConsensusLevel::Deadlock);
        assert_eq!(result.dissenting.len(), 2);
    }

    #[test]
    fn test_split_is_weak() {
        let detector = ConsensusDetector::default();
        let answers = vec![
            answer("a", "Expand", 70),
            answer("b", "expand", 65),
            answer("c", "Wait", 60),
        ];
        let result = detector.detect(&answers);

        assert_eq!(result.level, ConsensusLevel::Weak);
        assert_eq!(result.majority_count, 2);
        assert_eq!(result.majority_answer, "Expand");
        let expected = (70.0 * 70.0 + 65.0 * 65.0) / 135.0;
        assert!((result.weighted_confidence - expected).abs() < 1e-9);
        assert_eq!(result.dissenting[0].agent_name, "c");
    }

    #[test]
    fn test_moderate() {
        let detector = ConsensusDetector::default();
        let answers = vec![
            answer("a", "Go", 70),
            answer("b", "go", 70),
            answer("c", "go", 65),
            answer("d", "Stop", 90),
        ];
        let result = detector.detect(&answers);
        assert_eq!(result.agreement_score, 0.75);
        assert_eq!(result.level, ConsensusLevel::Moderate);
    }

    #[test]
    fn test_single_agent_is_weak() {
        let detector = ConsensusDetector::default();
        let result = detector.detect(&[answer("solo", "Yes", 100)]);
        assert_eq!(result.level, ConsensusLevel::Weak);
        assert_eq!(result.agreement_score, 1.0);
    }

    #[test]
    fn test_empty_is_deadlock() {
        let detector = ConsensusDetector::default();
        let first = detector.detect(&[]);
        let second = detector.detect(&[]);
        assert_eq!(first, second);
        assert_eq!(first.level, ConsensusLevel::Deadlock);
        assert_eq!(first.total_agents, 0);
        assert_eq!(first.majority_count, 0);
        assert_eq!(first.weighted_confidence, 0.0);
    }

    #[test]
    fn test_zero_confidence_group() {
        let detector = ConsensusDetector::default();
        let result = detector.detect(&[answer("a", "x", 0), answer("b", "x", 0)]);
        assert_eq!(result.weighted_confidence, 0.0);
        assert_eq!(result.level, ConsensusLevel::Weak);
    }

    #[test]
    fn test_tie_keeps_first_group() {
        let detector = ConsensusDetector::default();
        let result = detector.detect(&[answer("a", "left", 50), answer("b", "right", 50)]);
        assert_eq!(result.majority_answer, "left");
        assert_eq!(result.level, ConsensusLevel::Deadlock);
    }

    #[test]
    fn test_should_continue() {
        let mut result = ConsensusResult::empty();
        assert!(should_continue_debate(&result, 0, 3));
        assert!(should_continue_debate(&result, 1, 3));
        assert!(!should_continue_debate(&result, 2, 3));
        assert!(!should_continue_debate(&result, 0, 1));
        assert!(!should_continue_debate(&result, 0, 0));

        result.level = ConsensusLevel::Strong;
        assert!(!should_continue_debate(&result, 0, 10));
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = ConsensusDetector::new(ConsensusConfig {
            agreement_threshold: 0.6,
            strong_confidence: 70.0,
            moderate_confidence: 50.0,
        });
        let answers = vec![
            answer("a", "Expand", 70),
            answer("b", "expand", 75),
            answer("c", "Wait", 60),
        ];
        assert_eq!(detector.detect(&answers).level, ConsensusLevel::Strong);
    }
}
