//! Progress emission towards an external display.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::domain::{ProgressEvent, RunTotals, TaskStatus};

#[derive(Default)]
struct TotalsCell {
    completed: AtomicU32,
    failed: AtomicU32,
    total: AtomicU32,
}

/// Fire-and-forget progress sender shared across the engine.
///
/// The counters are mutated only by the aggregator; workers merely read a
/// snapshot when they emit `Started`/`Retrying`. A consumer that stopped
/// listening never stalls or fails the run.
#[derive(Clone)]
pub struct ProgressEmitter {
    run_id: Uuid,
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    totals: Arc<TotalsCell>,
}

impl ProgressEmitter {
    /// Emitter plus the stream the display consumes.
    pub fn channel(run_id: Uuid) -> (Self, UnboundedReceiverStream<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                run_id,
                tx: Some(tx),
                totals: Arc::default(),
            },
            UnboundedReceiverStream::new(rx),
        )
    }

    /// Emitter that drops every event. Counters still work.
    pub fn disabled(run_id: Uuid) -> Self {
        Self {
            run_id,
            tx: None,
            totals: Arc::default(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn set_total(&self, total: u32) {
        self.totals.total.store(total, Ordering::SeqCst);
    }

    /// Aggregator only.
    pub fn record_completed(&self) {
        self.totals.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Aggregator only.
    pub fn record_failed(&self) {
        self.totals.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RunTotals {
        RunTotals {
            completed: self.totals.completed.load(Ordering::SeqCst),
            failed: self.totals.failed.load(Ordering::SeqCst),
            total: self.totals.total.load(Ordering::SeqCst),
        }
    }

    pub fn emit(&self, phase: &str, game_id: &str, status: TaskStatus) {
        let Some(tx) = &self.tx else { return };
        let event = ProgressEvent {
            run_id: self.run_id,
            phase: phase.to_string(),
            game_id: game_id.to_string(),
            status,
            totals: self.snapshot(),
            timestamp: Utc::now(),
        };
        let _ = tx.send(event);
    }
}
