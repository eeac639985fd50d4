//! Worker loop and supervised pool.
//!
//! Workers pull tasks off a shared queue (the mutex-guarded receiver gives
//! the single-consumer-per-item guarantee), fetch with their own browser
//! session, parse and validate, and push exactly one terminal result per
//! task to the aggregator. Every task-level error is converted here; none
//! propagate upward.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::application::events::ProgressEmitter;
use crate::domain::{
    BoxscoreRow, ConsistencyValidator, ErrorKind, GameStatus, ScrapeTask, TaskOutcome, TaskResult,
    TaskStatus, ValidationReport,
};
use crate::infrastructure::page_client::{
    FetchError, PageClient, PageClientFactory, ReadinessProbe,
};
use crate::infrastructure::parsing::{BoxscoreParser, ParseError};
use crate::infrastructure::retry::{RetryDecision, RetryPolicy};

/// Task-level failure as seen by the worker.
#[derive(Debug, Error)]
pub(crate) enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl TaskError {
    fn kind(&self) -> ErrorKind {
        match self {
            TaskError::Fetch(e) => e.kind(),
            // The fetch already waited for the readiness probe, so a parse
            // failure here is structural; the policy still allows it one
            // retry to rule out a residual loading race.
            TaskError::Parse(_) => ErrorKind::Parse,
        }
    }
}

/// Shared state of the pool, cheap to clone per worker.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub factory: Arc<dyn PageClientFactory>,
    pub parser: Arc<BoxscoreParser>,
    pub probe: ReadinessProbe,
    pub validator: Arc<ConsistencyValidator>,
    pub policy: RetryPolicy,
    pub emitter: ProgressEmitter,
    pub task_tx: mpsc::UnboundedSender<ScrapeTask>,
    pub task_rx: Arc<Mutex<mpsc::UnboundedReceiver<ScrapeTask>>>,
    pub result_tx: mpsc::UnboundedSender<TaskResult>,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub(crate) enum WorkerExit {
    /// Clean exit: cancellation observed.
    Finished,
    /// No session could be (re)acquired; the supervisor decides.
    SessionFailed,
}

/// Session (re)creation attempts per worker before handing the problem to
/// the supervisor.
const SESSION_ATTEMPTS: u32 = 3;

/// Respawns granted per original worker slot before the pool gives up.
const RESPAWNS_PER_WORKER: usize = 3;

/// Fixed-size pool plus a supervisor that replaces abnormally exited
/// workers without losing queued tasks.
pub(crate) struct WorkerPool {
    supervisor: tokio::task::JoinHandle<()>,
}

impl WorkerPool {
    pub fn spawn(size: usize, ctx: WorkerContext) -> Self {
        Self {
            supervisor: tokio::spawn(supervise(size, ctx)),
        }
    }

    /// Wait for every worker to exit and release its session.
    pub async fn shutdown(self) {
        let _ = self.supervisor.await;
    }
}

async fn supervise(size: usize, ctx: WorkerContext) {
    let mut workers = JoinSet::new();
    for id in 0..size {
        workers.spawn(run_worker(id, ctx.clone()));
    }
    let mut next_id = size;
    let mut respawn_budget = size * RESPAWNS_PER_WORKER;

    while let Some(joined) = workers.join_next().await {
        let respawn = match joined {
            Ok(WorkerExit::Finished) => false,
            Ok(WorkerExit::SessionFailed) => true,
            Err(e) => {
                error!(error = %e, "worker task aborted");
                true
            }
        };
        if respawn && !ctx.cancel.is_cancelled() {
            if respawn_budget == 0 {
                error!("worker respawn budget exhausted, shutting the pool down");
                ctx.cancel.cancel();
                continue;
            }
            respawn_budget -= 1;
            warn!(replacement = next_id, "respawning worker");
            workers.spawn(run_worker(next_id, ctx.clone()));
            next_id += 1;
        }
    }
}

async fn run_worker(id: usize, ctx: WorkerContext) -> WorkerExit {
    let Some(mut client) = acquire_session(id, &ctx).await else {
        return WorkerExit::SessionFailed;
    };
    debug!(worker = id, "worker online");

    loop {
        let Some(mut task) = next_task(&ctx).await else {
            break;
        };
        task.game.status = GameStatus::InProgress;
        if task.attempt == 0 {
            ctx.emitter
                .emit(&task.game.key.phase, &task.game.game_id, TaskStatus::Started);
        }

        match process(client.as_mut(), &task, &ctx).await {
            Ok((rows, report)) => {
                let mut game = task.game;
                game.status = GameStatus::Succeeded;
                let _ = ctx.result_tx.send(TaskResult {
                    game,
                    outcome: TaskOutcome::Rows(rows, report),
                });
            }
            Err(err) => {
                let kind = err.kind();
                match ctx.policy.decide(kind, task.attempt) {
                    RetryDecision::Retry(delay) => {
                        let next = task.bump();
                        warn!(
                            worker = id,
                            game = %next.game.key,
                            attempt = next.attempt,
                            error = %err,
                            "attempt failed, requeueing"
                        );
                        ctx.emitter.emit(
                            &next.game.key.phase,
                            &next.game.game_id,
                            TaskStatus::Retrying {
                                attempt: next.attempt,
                            },
                        );
                        schedule_requeue(&ctx, next, delay);
                    }
                    RetryDecision::GiveUp => {
                        let mut game = task.game;
                        game.status = GameStatus::Failed;
                        error!(worker = id, game = %game.key, error = %err, "giving up on game");
                        let _ = ctx.result_tx.send(TaskResult {
                            game,
                            outcome: TaskOutcome::Error {
                                kind,
                                message: err.to_string(),
                                attempts: task.attempt + 1,
                            },
                        });
                    }
                }
                if kind == ErrorKind::Fatal {
                    // The session cannot be trusted any more.
                    warn!(worker = id, "fatal fetch error, replacing browser session");
                    client.close().await;
                    match acquire_session(id, &ctx).await {
                        Some(fresh) => client = fresh,
                        None => return WorkerExit::SessionFailed,
                    }
                }
            }
        }
    }

    client.close().await;
    debug!(worker = id, "worker done");
    WorkerExit::Finished
}

/// Pull the next task. The mutex makes the receiver single-consumer, so no
/// task is ever processed by two workers at once.
async fn next_task(ctx: &WorkerContext) -> Option<ScrapeTask> {
    let mut rx = ctx.task_rx.lock().await;
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        task = rx.recv() => task,
    }
}

async fn process(
    client: &mut dyn PageClient,
    task: &ScrapeTask,
    ctx: &WorkerContext,
) -> Result<(Vec<BoxscoreRow>, ValidationReport), TaskError> {
    let page = client.fetch(&task.game.url, &ctx.probe).await?;
    let rows = ctx.parser.parse(&page.html)?;
    let report = ctx.validator.validate(&rows);
    Ok((rows, report))
}

/// Detached delayed requeue; honors cancellation so a stopped run never
/// resurrects tasks.
fn schedule_requeue(ctx: &WorkerContext, task: ScrapeTask, delay: Duration) {
    let tx = ctx.task_tx.clone();
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                let _ = tx.send(task);
            }
        }
    });
}

async fn acquire_session(id: usize, ctx: &WorkerContext) -> Option<Box<dyn PageClient>> {
    for attempt in 0..SESSION_ATTEMPTS {
        if ctx.cancel.is_cancelled() {
            return None;
        }
        match ctx.factory.create().await {
            Ok(client) => return Some(client),
            Err(e) => {
                warn!(worker = id, attempt, error = %e, "session creation failed");
                tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt + 1))).await;
            }
        }
    }
    None
}
