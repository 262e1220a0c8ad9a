//! # Conclave Debate
//!
//! The building blocks of a multi-agent debate.
//!
//! ## Key Types
//!
//! - [`DebateAgent`] — Role-bound wrapper around one LLM call
//! - [`ConsensusDetector`] — Confidence-weighted agreement over one round
//! - [`EventSink`] — Best-effort progress notifications
//!
//! ## Consensus
//!
//! ```rust
//! use conclave_core::{ConsensusLevel, StructuredAnswer};
//! use conclave_debate::ConsensusDetector;
//!
//! let detector = ConsensusDetector::default();
//! let result = detector.detect(&[
//!     StructuredAnswer::new("analyst", "gpt-4o", "Yes, expand", 85),
//!     StructuredAnswer::new("skeptic", "claude-3-5-sonnet", "yes, expand", 90),
//!     StructuredAnswer::new("strategist", "gemini-1.5-pro", "Yes, expand.", 80),
//! ]);
//!
//! assert_eq!(result.level, ConsensusLevel::Strong);
//! assert_eq!(result.agreement_score, 1.0);
//! ```

pub mod agent;
pub mod consensus;
pub mod events;
pub mod parse;

pub use agent::{round_prompt, AgentError, AgentResponse, AgentRole, DebateAgent, RESPONSE_CONTRACT};
pub use consensus::{
    average_confidence, normalize_answer, should_continue_debate, ConsensusConfig,
    ConsensusDetector, FILLER_PREFIXES,
};
pub use events::{
    emit_quietly, ChannelEventSink, DebateEvent, EventError, EventSink, LoggingEventSink,
    NoopEventSink,
};
pub use parse::{parse_reply, AnswerPayload, ParsedReply};
