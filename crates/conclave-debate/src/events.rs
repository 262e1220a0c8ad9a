//! Progress notifications
//!
//! Debates and validations report progress through an [`EventSink`]. Delivery
//! is best effort: a sink error is logged and never fails the debate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use conclave_core::{ConsensusLevel, DebateStatus, HypothesisStatus};

/// Errors from event delivery
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event channel closed")]
    Closed,
    #[error("Event channel full")]
    Full,
    #[error("Event delivery failed: {0}")]
    Delivery(String),
}

/// A progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebateEvent {
    RoundCompleted {
        debate_id: Uuid,
        round: u32,
        consensus_level: ConsensusLevel,
        average_confidence: f64,
    },
    DebateFinished {
        debate_id: Uuid,
        status: DebateStatus,
        rounds: usize,
        consensus_level: ConsensusLevel,
        final_confidence: f64,
        total_cost: f64,
        duration_ms: Option<i64>,
    },
    ValidationCompleted {
        validation_id: Uuid,
        hypothesis_id: Uuid,
        debate_id: Uuid,
        status: HypothesisStatus,
        score: f64,
        consensus_level: ConsensusLevel,
        duration_ms: i64,
        total_cost: f64,
    },
    ValidationFailed {
        validation_id: Uuid,
        hypothesis_id: Uuid,
        debate_id: Option<Uuid>,
        error: String,
        duration_ms: i64,
    },
}

impl DebateEvent {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundCompleted { .. } => "round_completed",
            Self::DebateFinished { .. } => "debate_finished",
            Self::ValidationCompleted { .. } => "validation_completed",
            Self::ValidationFailed { .. } => "validation_failed",
        }
    }
}

/// Receiver of progress notifications
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: DebateEvent) -> Result<(), EventError>;
}

/// Deliver an event, logging instead of failing
pub async fn emit_quietly(sink: &dyn EventSink, event: DebateEvent) {
    let kind = event.kind();
    if let Err(e) = sink.emit(event).await {
        tracing::warn!(event = kind, error = %e, "Event delivery failed");
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: DebateEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Writes every event to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: DebateEvent) -> Result<(), EventError> {
        let payload =
            serde_json::to_string(&event).map_err(|e| EventError::Delivery(e.to_string()))?;
        tracing::info!(event = event.kind(), %payload, "Debate event");
        Ok(())
    }
}

/// Forwards events into a bounded tokio channel without waiting
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<DebateEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver that drains it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DebateEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: DebateEvent) -> Result<(), EventError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EventError::Full,
            mpsc::error::TrySendError::Closed(_) => EventError::Closed,
        })
    }
}
