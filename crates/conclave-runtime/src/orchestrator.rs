//! Orchestrator - drives multi-round debates between agents

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use conclave_core::{DebateResult, DebateRound, DebateStatus, StateError, StructuredAnswer};
use conclave_debate::{
    average_confidence, emit_quietly, should_continue_debate, AgentError, AgentResponse,
    ConsensusConfig, ConsensusDetector, DebateAgent, DebateEvent, EventSink, NoopEventSink,
};

/// How agents are invoked within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    /// All agents at once, joined under the round timeout
    #[default]
    Parallel,
    /// One agent at a time
    Sequential,
}

impl std::str::FromStr for CollectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown collection mode: {}", other)),
        }
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of rounds
    pub max_rounds: u32,
    /// How agents are invoked within a round
    pub mode: CollectionMode,
    /// Limit on collecting one round's answers
    pub round_timeout: Duration,
    /// Fail the debate if any agent fails instead of skipping it
    pub require_all_agents: bool,
    /// Sampling temperature for agents built from this config
    pub temperature: f32,
    /// Reply token limit for agents built from this config
    pub max_tokens: u32,
    /// Consensus thresholds
    pub consensus: ConsensusConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            mode: CollectionMode::Parallel,
            round_timeout: Duration::from_secs(120),
            require_all_agents: false,
            temperature: 0.7,
            max_tokens: 2048,
            consensus: ConsensusConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Load overrides from the environment
    ///
    /// Reads `CONCLAVE_MAX_ROUNDS`, `CONCLAVE_ROUND_TIMEOUT_SECS`,
    /// `CONCLAVE_COLLECTION_MODE` and `CONCLAVE_REQUIRE_ALL_AGENTS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_rounds: env::var("CONCLAVE_MAX_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_rounds),
            mode: env::var("CONCLAVE_COLLECTION_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mode),
            round_timeout: env::var("CONCLAVE_ROUND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.round_timeout),
            require_all_agents: env::var("CONCLAVE_REQUIRE_ALL_AGENTS")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(defaults.require_all_agents),
            ..defaults
        }
    }
}

/// Errors in setting up a debate
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("No agents configured")]
    NoAgents,
}

/// Why a debate stopped early
enum DebateFailure {
    Timeout(String),
    Failed(String),
}

impl From<StateError> for DebateFailure {
    fn from(e: StateError) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Runs debates among a fixed panel of agents
pub struct DebateOrchestrator {
    /// Configuration
    pub config: OrchestratorConfig,
    agents: Vec<DebateAgent>,
    detector: ConsensusDetector,
    events: Arc<dyn EventSink>,
}

impl DebateOrchestrator {
    /// Create an orchestrator; a panel needs at least one agent
    pub fn new(agents: Vec<DebateAgent>, config: OrchestratorConfig) -> Result<Self, DebateError> {
        if agents.is_empty() {
            return Err(DebateError::NoAgents);
        }
        Ok(Self {
            detector: ConsensusDetector::new(config.consensus),
            config,
            agents,
            events: Arc::new(NoopEventSink),
        })
    }

    /// Report progress to the given sink
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The sink progress is reported to
    pub fn events(&self) -> Arc<dyn EventSink> {
        self.events.clone()
    }

    pub fn agents(&self) -> &[DebateAgent] {
        &self.agents
    }

    /// Run a debate to a terminal status
    ///
    /// Always returns a result; failures are reported through its status.
    pub async fn debate(&self, question: &str, context: Option<&str>) -> DebateResult {
        let mut result = DebateResult::new(question);

        tracing::info!(
            debate_id = %result.debate_id,
            agents = self.agents.len(),
            max_rounds = self.config.max_rounds,
            mode = ?self.config.mode,
            "Debate started"
        );

        let outcome = self.run_rounds(&mut result, question, context).await;
        self.compile(&mut result, outcome);

        metrics::counter!("conclave_debates_total", "status" => result.status.to_string())
            .increment(1);
        metrics::histogram!("conclave_debate_rounds").record(result.total_rounds() as f64);

        tracing::info!(
            debate_id = %result.debate_id,
            status = %result.status,
            rounds = result.total_rounds(),
            level = %result.consensus_level,
            final_confidence = result.final_confidence,
            total_cost = result.total_cost,
            "Debate finished"
        );

        emit_quietly(
            self.events.as_ref(),
            DebateEvent::DebateFinished {
                debate_id: result.debate_id,
                status: result.status,
                rounds: result.total_rounds(),
                consensus_level: result.consensus_level,
                final_confidence: result.final_confidence,
                total_cost: result.total_cost,
                duration_ms: result.duration_ms(),
            },
        )
        .await;

        result
    }

    async fn run_rounds(
        &self,
        result: &mut DebateResult,
        question: &str,
        context: Option<&str>,
    ) -> Result<(), DebateFailure> {
        result.begin()?;
        let max_rounds = self.config.max_rounds;

        // Only the previous round's answers are carried forward
        let mut prior: Option<Vec<StructuredAnswer>> = None;

        for round in 0..max_rounds {
            let started_at = Utc::now();
            let responses = self
                .collect_round(result, round, question, context, prior.as_deref())
                .await?;

            let answers: Vec<StructuredAnswer> = responses.into_iter().map(|r| r.answer).collect();
            let consensus = self.detector.detect(&answers);
            let keep_going = should_continue_debate(&consensus, round, max_rounds);

            tracing::info!(
                debate_id = %result.debate_id,
                round,
                answers = answers.len(),
                level = %consensus.level,
                agreement = consensus.agreement_score,
                weighted_confidence = consensus.weighted_confidence,
                "Round completed"
            );

            emit_quietly(
                self.events.as_ref(),
                DebateEvent::RoundCompleted {
                    debate_id: result.debate_id,
                    round,
                    consensus_level: consensus.level,
                    average_confidence: average_confidence(&answers),
                },
            )
            .await;

            result.record_round(DebateRound {
                round_number: round,
                answers: answers.clone(),
                consensus: Some(consensus),
                started_at,
                completed_at: Utc::now(),
            })?;

            if !keep_going {
                break;
            }
            prior = Some(answers);
        }

        Ok(())
    }

    /// Collect one round of answers under the round timeout
    ///
    /// The cost of every successful call is charged to `result`, even when
    /// the round itself fails.
    async fn collect_round(
        &self,
        result: &mut DebateResult,
        round: u32,
        question: &str,
        context: Option<&str>,
        prior: Option<&[StructuredAnswer]>,
    ) -> Result<Vec<AgentResponse>, DebateFailure> {
        let collect = async {
            match self.config.mode {
                CollectionMode::Parallel => {
                    join_all(
                        self.agents
                            .iter()
                            .map(|agent| agent.respond(question, context, prior)),
                    )
                    .await
                }
                CollectionMode::Sequential => {
                    let mut outcomes = Vec::with_capacity(self.agents.len());
                    for agent in &self.agents {
                        outcomes.push(agent.respond(question, context, prior).await);
                    }
                    outcomes
                }
            }
        };

        let timeout = self.config.round_timeout;
        let outcomes: Vec<Result<AgentResponse, AgentError>> =
            tokio::time::timeout(timeout, collect).await.map_err(|_| {
                tracing::warn!(round, timeout_ms = timeout.as_millis() as u64, "Round timed out");
                DebateFailure::Timeout(format!(
                    "round {} timed out after {}ms",
                    round,
                    timeout.as_millis()
                ))
            })?;

        let mut responses = Vec::with_capacity(outcomes.len());
        let mut failure = None;
        for (agent, outcome) in self.agents.iter().zip(outcomes) {
            match outcome {
                Ok(response) => responses.push(response),
                Err(e) => {
                    metrics::counter!("conclave_agent_failures_total").increment(1);
                    tracing::warn!(round, agent = %agent.name(), error = %e, "Agent failed, skipping");
                    if self.config.require_all_agents && failure.is_none() {
                        failure = Some(DebateFailure::Failed(format!("round {}: {}", round, e)));
                    }
                }
            }
        }

        result.add_cost(responses.iter().map(|r| r.cost).sum())?;
        if let Some(failure) = failure {
            return Err(failure);
        }

        if responses.is_empty() {
            return Err(DebateFailure::Failed(format!(
                "all {} agents failed in round {}",
                self.agents.len(),
                round
            )));
        }

        Ok(responses)
    }

    /// Derive the final answer from the last round and set the terminal status
    fn compile(&self, result: &mut DebateResult, outcome: Result<(), DebateFailure>) {
        let summary = result.last_round().map(|last| {
            let consensus = last
                .consensus
                .clone()
                .unwrap_or_else(|| self.detector.detect(&last.answers));
            let (answer, confidence) = if consensus.majority_answer.is_empty() {
                last.highest_confidence_answer()
                    .map(|a| (a.answer.clone(), f64::from(a.confidence)))
                    .unwrap_or_default()
            } else {
                (consensus.majority_answer.clone(), consensus.weighted_confidence)
            };
            (answer, confidence, consensus.level, consensus.dissenting)
        });

        if let Some((answer, confidence, level, dissenting)) = summary {
            if let Err(e) = result.set_outcome(answer, confidence, level, dissenting) {
                tracing::error!(error = %e, "Could not record debate outcome");
            }
        }

        let finished = match outcome {
            Ok(()) if result.rounds.is_empty() => result.fail("no rounds completed"),
            Ok(()) => result.complete(),
            Err(DebateFailure::Timeout(msg)) => result.time_out(msg),
            Err(DebateFailure::Failed(msg)) => result.fail(msg),
        };
        if let Err(e) = finished {
            tracing::error!(error = %e, "Could not finish debate");
        }

        debug_assert!(result.status != DebateStatus::InProgress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::ConsensusLevel;
    use conclave_debate::AgentRole;
    use conclave_llm::{json_answer, LlmError, MockProvider};

    fn agent(role: AgentRole, answer: &str, confidence: u8) -> DebateAgent {
        DebateAgent::new(role, Arc::new(MockProvider::answering(answer, confidence)))
    }

    #[tokio::test]
    async fn test_strong_consensus_stops_after_first_round() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                agent(AgentRole::Analyst, "Yes, expand", 85),
                agent(AgentRole::Skeptic, "Yes, expand", 90),
                agent(AgentRole::Strategist, "Yes, expand", 80),
            ],
            OrchestratorConfig::default(),
        )
        .unwrap();

        let result = orchestrator.debate("Should we expand?", None).await;

        assert_eq!(result.status, DebateStatus::Completed);
        assert_eq!(result.total_rounds(), 1);
        assert_eq!(result.consensus_level, ConsensusLevel::Strong);
        assert!(result.final_answer.eq_ignore_ascii_case("yes, expand"));
        assert!(result.dissenting_views.is_empty());
    }

    #[tokio::test]
    async fn test_zero_agents_is_rejected() {
        let err = DebateOrchestrator::new(Vec::new(), OrchestratorConfig::default());
        assert!(matches!(err, Err(DebateError::NoAgents)));
    }

    #[tokio::test]
    async fn test_zero_rounds_fails() {
        let orchestrator = DebateOrchestrator::new(
            vec![agent(AgentRole::Analyst, "Yes", 90)],
            OrchestratorConfig {
                max_rounds: 0,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Failed);
        assert_eq!(result.error_message.as_deref(), Some("no rounds completed"));
    }

    #[tokio::test]
    async fn test_failed_agent_is_skipped() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                agent(AgentRole::Analyst, "Go", 90),
                agent(AgentRole::Skeptic, "Go", 85),
                DebateAgent::new(
                    AgentRole::Pragmatist,
                    Arc::new(MockProvider::failing(LlmError::NotAvailable)),
                ),
            ],
            OrchestratorConfig::default(),
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Completed);
        assert_eq!(result.rounds[0].answers.len(), 2);
        assert_eq!(result.consensus_level, ConsensusLevel::Strong);
    }

    #[tokio::test]
    async fn test_require_all_agents_fails_debate() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                agent(AgentRole::Analyst, "Go", 90),
                DebateAgent::new(
                    AgentRole::Skeptic,
                    Arc::new(MockProvider::failing(LlmError::RateLimited)),
                ),
            ],
            OrchestratorConfig {
                require_all_agents: true,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Failed);
        assert!(result.error_message.unwrap().contains("skeptic"));
        assert!(result.rounds.is_empty());
    }

    #[tokio::test]
    async fn test_all_agents_failing_fails_debate() {
        let orchestrator = DebateOrchestrator::new(
            vec![DebateAgent::new(
                AgentRole::Analyst,
                Arc::new(MockProvider::failing(LlmError::NotAvailable)),
            )],
            OrchestratorConfig::default(),
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Failed);
        assert!(result.error_message.unwrap().contains("all 1 agents failed"));
    }

    #[tokio::test]
    async fn test_sequential_mode_collects_every_agent() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                agent(AgentRole::Analyst, "Go", 70),
                agent(AgentRole::Skeptic, "Stop", 70),
            ],
            OrchestratorConfig {
                mode: CollectionMode::Sequential,
                max_rounds: 2,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Completed);
        assert_eq!(result.total_rounds(), 2);
        assert!(result.rounds.iter().all(|r| r.answers.len() == 2));
        assert_eq!(result.consensus_level, ConsensusLevel::Deadlock);
        assert_eq!(result.final_answer, "Go");
        assert_eq!(result.dissenting_views.len(), 1);
    }

    #[tokio::test]
    async fn test_costs_are_summed() {
        let priced = |answer: &str| {
            DebateAgent::new(
                AgentRole::Analyst,
                Arc::new(MockProvider::constant(&json_answer(answer, 60, &[])).with_cost(0.5)),
            )
        };
        let orchestrator = DebateOrchestrator::new(
            vec![priced("a").with_name("one"), priced("b").with_name("two")],
            OrchestratorConfig {
                max_rounds: 2,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.total_rounds(), 2);
        assert!((result.total_cost - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_round_still_charges_successful_calls() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                DebateAgent::new(
                    AgentRole::Analyst,
                    Arc::new(MockProvider::constant(&json_answer("Go", 80, &[])).with_cost(1.5)),
                ),
                DebateAgent::new(
                    AgentRole::Skeptic,
                    Arc::new(MockProvider::failing(LlmError::RateLimited)),
                ),
            ],
            OrchestratorConfig {
                require_all_agents: true,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Failed);
        assert!(result.rounds.is_empty());
        assert!((result.total_cost - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sequential_mode_skips_failed_agent() {
        let orchestrator = DebateOrchestrator::new(
            vec![
                DebateAgent::new(
                    AgentRole::Analyst,
                    Arc::new(MockProvider::failing(LlmError::NotAvailable)),
                ),
                agent(AgentRole::Skeptic, "Go", 90),
                agent(AgentRole::Strategist, "Go", 85),
            ],
            OrchestratorConfig {
                mode: CollectionMode::Sequential,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        assert_eq!(result.status, DebateStatus::Completed);
        assert_eq!(result.total_rounds(), 1);
        let names: Vec<&str> = result.rounds[0]
            .answers
            .iter()
            .map(|a| a.agent_name.as_str())
            .collect();
        assert_eq!(names, ["skeptic", "strategist"]);
        assert_eq!(result.final_answer, "Go");
    }

    #[tokio::test]
    async fn test_empty_majority_falls_back_to_highest_confidence() {
        let blank = |name: &str| {
            DebateAgent::new(AgentRole::Analyst, Arc::new(MockProvider::constant("")))
                .with_name(name)
        };
        let orchestrator = DebateOrchestrator::new(
            vec![
                blank("blank-1"),
                blank("blank-2"),
                agent(AgentRole::Skeptic, "Hold", 90),
            ],
            OrchestratorConfig {
                max_rounds: 1,
                ..Default::default()
            },
        )
        .unwrap();

        let result = orchestrator.debate("q", None).await;
        // Two blank degraded answers (50 + 50) outweigh "Hold" (90) but say nothing
        let consensus = result.rounds[0].consensus.as_ref().unwrap();
        assert_eq!(consensus.majority_answer, "");
        assert_eq!(consensus.majority_count, 2);

        assert_eq!(result.status, DebateStatus::Completed);
        assert_eq!(result.final_answer, "Hold");
        assert_eq!(result.final_confidence, 90.0);
    }
}
