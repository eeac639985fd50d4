//! Progress events emitted towards an external display.
//!
//! The stream is one-directional and fire-and-forget: a consumer that went
//! away never stalls the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Per-task status changes as they happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    /// A worker picked the task up for its first attempt.
    Started,
    /// The task was requeued; `attempt` is the upcoming attempt number.
    Retrying { attempt: u32 },
    Succeeded,
    Failed,
}

/// Running counters of the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
}

impl RunTotals {
    /// Tasks that reached a terminal state.
    pub fn terminal(&self) -> u32 {
        self.completed + self.failed
    }
}

/// One entry of the progress stream.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub phase: String,
    pub game_id: String,
    pub status: TaskStatus,
    pub totals: RunTotals,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Completed,
    Cancelled,
}
