//! # Conclave Runtime
//!
//! Tokio-based debate orchestration and hypothesis validation.
//!
//! ## Key Types
//!
//! - [`DebateOrchestrator`] — Runs rounds until strong consensus or the round cap
//! - [`AgentRegistry`] — Explicit registry of agents and their providers
//! - [`HypothesisValidator`] — Debates a hypothesis and records the verdict
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use conclave_core::{ConsensusLevel, DebateStatus};
//! use conclave_debate::{AgentRole, DebateAgent};
//! use conclave_llm::MockProvider;
//! use conclave_runtime::{DebateOrchestrator, OrchestratorConfig};
//!
//! let agents = vec![
//!     DebateAgent::new(AgentRole::Analyst, Arc::new(MockProvider::answering("Yes, expand", 85))),
//!     DebateAgent::new(AgentRole::Skeptic, Arc::new(MockProvider::answering("yes, expand", 90))),
//! ];
//! let orchestrator = DebateOrchestrator::new(agents, OrchestratorConfig::default()).unwrap();
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime.block_on(orchestrator.debate("Should we expand to Europe?", None));
//!
//! assert_eq!(result.status, DebateStatus::Completed);
//! assert_eq!(result.consensus_level, ConsensusLevel::Strong);
//! ```

pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod validator;

pub use orchestrator::{CollectionMode, DebateError, DebateOrchestrator, OrchestratorConfig};
pub use registry::{AgentRegistry, RegistryError};
pub use report::{recommendation, ValidationReport};
pub use validator::{
    consensus_multiplier, derive_status, extract_evidence, is_rejection, validation_question,
    validation_score, HypothesisValidationResult, HypothesisValidator, ValidationError,
    ValidationOutcome, ValidatorConfig, REJECTION_KEYWORDS,
};
