//! # Conclave Core
//!
//! Plain, serializable records shared by every Conclave crate:
//! - [`StructuredAnswer`] — One agent's answer for one round
//! - [`ConsensusResult`], [`DebateRound`], [`DebateResult`] — Debate progress and outcome
//! - [`Hypothesis`], [`Evidence`] — Statements under validation and what was learned about them
//!
//! Nothing here talks to a model or a database; callers persist these records
//! however they like.

pub mod answer;
pub mod debate;
pub mod error;
pub mod evidence;
pub mod hypothesis;

pub use answer::{clamp_confidence, StructuredAnswer, DEGRADED_CONFIDENCE};
pub use debate::{ConsensusLevel, ConsensusResult, DebateResult, DebateRound, DebateStatus};
pub use error::StateError;
pub use evidence::Evidence;
pub use hypothesis::{
    priority_score, Hypothesis, HypothesisCategory, HypothesisHandle, HypothesisStatus, Level,
    Testability,
};
