//! Event types published while a provisioning run progresses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Sequencer started a run
    #[serde(rename = "run.started")]
    RunStarted { run_id: Uuid, total_steps: usize },

    /// A step began executing
    #[serde(rename = "step.started")]
    StepStarted {
        run_id: Uuid,
        step: String,
        index: usize,
    },

    /// A step was bypassed by a skip flag
    #[serde(rename = "step.skipped")]
    StepSkipped { run_id: Uuid, step: String },

    /// A step reached a terminal outcome
    #[serde(rename = "step.finished")]
    StepFinished {
        run_id: Uuid,
        step: String,
        outcome: String,
        detail: Option<String>,
        duration_ms: u64,
    },

    /// Validation pass produced its report
    #[serde(rename = "validation.completed")]
    ValidationCompleted {
        run_id: Uuid,
        accessible: usize,
        total: usize,
    },

    /// Run reached a terminal state
    #[serde(rename = "run.finished")]
    RunFinished { run_id: Uuid, state: String },
}

impl Event {
    /// Get the run ID associated with this event
    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::StepStarted { run_id, .. }
            | Event::StepSkipped { run_id, .. }
            | Event::StepFinished { run_id, .. }
            | Event::ValidationCompleted { run_id, .. }
            | Event::RunFinished { run_id, .. } => *run_id,
        }
    }

    /// Whether this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunFinished { .. })
    }
}
