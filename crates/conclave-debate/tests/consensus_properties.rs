use conclave_core::{ConsensusLevel, ConsensusResult, StructuredAnswer};
use conclave_debate::{should_continue_debate, ConsensusDetector};
use proptest::prelude::*;

fn answers_from(texts_and_confidences: &[(String, u8)]) -> Vec<StructuredAnswer> {
    texts_and_confidences
        .iter()
        .enumerate()
        .map(|(i, (text, c))| StructuredAnswer::new(format!("agent{}", i), "mock", text.clone(), i64::from(*c)))
        .collect()
}

fn level_strategy() -> impl Strategy<Value = ConsensusLevel> {
    prop_oneof![
        Just(ConsensusLevel::Strong),
        Just(ConsensusLevel::Moderate),
        Just(ConsensusLevel::Weak),
        Just(ConsensusLevel::Deadlock),
    ]
}

proptest! {
    #[test]
    fn unanimous_high_confidence_is_strong(
        answer in "[a-z]{1,12}",
        confidences in prop::collection::vec(80u8..=100, 2..8),
    ) {
        let answers: Vec<StructuredAnswer> = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| {
                // Vary the surface form; normalization must still group them
                let text = if i % 2 == 0 { format!("I believe {}", answer) } else { answer.to_uppercase() };
                StructuredAnswer::new(format!("agent{}", i), "mock", text, i64::from(*c))
            })
            .collect();

        let result = ConsensusDetector::default().detect(&answers);
        prop_assert_eq!(result.level, ConsensusLevel::Strong);
        prop_assert_eq!(result.agreement_score, 1.0);
        prop_assert!(result.dissenting.is_empty());
    }

    #[test]
    fn fewer_than_two_agents_never_strong_or_moderate(
        entries in prop::collection::vec(("[a-c]", 0u8..=100), 0..2),
    ) {
        let result = ConsensusDetector::default().detect(&answers_from(&entries));
        prop_assert!(result.level != ConsensusLevel::Strong);
        prop_assert!(result.level != ConsensusLevel::Moderate);
    }

    #[test]
    fn detection_invariants(
        entries in prop::collection::vec(("[a-d]", 0u8..=100), 1..10),
    ) {
        let answers = answers_from(&entries);
        let result = ConsensusDetector::default().detect(&answers);

        prop_assert_eq!(result.total_agents, answers.len());
        prop_assert_eq!(result.majority_count + result.dissenting.len(), answers.len());
        prop_assert!((0.0..=1.0).contains(&result.agreement_score));
        prop_assert!((0.0..=100.0).contains(&result.weighted_confidence));
    }

    #[test]
    fn strong_or_last_round_always_stops(
        level in level_strategy(),
        max_rounds in 1u32..10,
        current in 0u32..10,
    ) {
        let mut result = ConsensusResult::empty();
        result.level = level;

        if level == ConsensusLevel::Strong {
            prop_assert!(!should_continue_debate(&result, current, max_rounds));
        }
        prop_assert!(!should_continue_debate(&result, max_rounds - 1, max_rounds));
    }
}

#[test]
fn empty_input_is_idempotent_deadlock() {
    let detector = ConsensusDetector::default();
    for _ in 0..3 {
        let result = detector.detect(&[]);
        assert_eq!(result, ConsensusResult::empty());
        assert_eq!(result.level, ConsensusLevel::Deadlock);
    }
}

#[test]
fn weighted_minority_wins_selection() {
    let answers = vec![
        StructuredAnswer::new("a", "m", "A", 40),
        StructuredAnswer::new("b", "m", "A", 40),
        StructuredAnswer::new("c", "m", "B", 95),
    ];
    let result = ConsensusDetector::default().detect(&answers);

    assert_eq!(result.majority_answer, "B");
    assert_eq!(result.majority_count, 1);
    assert_eq!(result.weighted_confidence, 95.0);
}
