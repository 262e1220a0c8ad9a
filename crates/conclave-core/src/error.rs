//! Errors for state transitions on core records

use thiserror::Error;
use uuid::Uuid;

use crate::hypothesis::HypothesisStatus;

/// Rejected state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Debate {0} already reached a terminal status")]
    DebateTerminal(Uuid),
    #[error("Hypothesis {0} is already being validated")]
    AlreadyValidating(Uuid),
    #[error("Hypothesis {id} is not being validated (status: {status})")]
    NotValidating { id: Uuid, status: HypothesisStatus },
}
