//! Scheduler/aggregator: the single owner of the run.
//!
//! Enumerates every (phase, game) pair up front, dispatches them to the
//! pool, then consumes exactly one terminal result per task. The dataset is
//! only ever touched on this consumer path, so the merge needs no locks.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::config::AppConfig;
use crate::application::events::ProgressEmitter;
use crate::application::worker::{WorkerContext, WorkerPool};
use crate::domain::{
    AggregateDataset, ConsistencyValidator, Phase, RunStatus, ScrapeTask, TaskOutcome, TaskResult,
    TaskStatus,
};
use crate::infrastructure::page_client::{PageClientFactory, ReadinessProbe};
use crate::infrastructure::parsing::BoxscoreParser;
use crate::infrastructure::retry::RetryPolicy;

pub struct ScrapeEngine {
    factory: Arc<dyn PageClientFactory>,
    parser: Arc<BoxscoreParser>,
    probe: ReadinessProbe,
    validator: Arc<ConsistencyValidator>,
    policy: RetryPolicy,
    emitter: ProgressEmitter,
    workers: usize,
    cancel: CancellationToken,
    season: String,
}

impl ScrapeEngine {
    pub fn from_config(
        config: &AppConfig,
        factory: Arc<dyn PageClientFactory>,
        emitter: ProgressEmitter,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            factory,
            parser: Arc::new(BoxscoreParser::new(&config.selectors.boxscore)?),
            probe: ReadinessProbe::css(&config.selectors.boxscore.readiness)?,
            validator: Arc::new(ConsistencyValidator::new(config.validation.clone())),
            policy: RetryPolicy::new(config.retry.clone()),
            emitter,
            workers: config.engine.workers.max(1),
            cancel,
            season: config.site.season.clone(),
        })
    }

    /// Run the extraction over all games of the given phases. Always
    /// returns: per-task errors become failure entries, and cancellation
    /// yields a partial dataset with an explicit status.
    pub async fn run(&self, phases: &[Phase]) -> AggregateDataset {
        let tasks: Vec<ScrapeTask> = phases
            .iter()
            .flat_map(|p| p.games.iter().cloned())
            .map(ScrapeTask::new)
            .collect();
        let total = tasks.len() as u32;
        info!(total, workers = self.workers, "starting extraction run");
        self.emitter.set_total(total);

        let mut dataset = AggregateDataset::new(self.emitter.run_id(), self.season.clone(), total);
        if total == 0 {
            return dataset;
        }

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        for task in tasks {
            let _ = task_tx.send(task);
        }

        // Child token: the pool also stops when the run is complete, not
        // just on external cancellation.
        let drain = self.cancel.child_token();
        let pool = WorkerPool::spawn(
            self.workers,
            WorkerContext {
                factory: Arc::clone(&self.factory),
                parser: Arc::clone(&self.parser),
                probe: self.probe.clone(),
                validator: Arc::clone(&self.validator),
                policy: self.policy.clone(),
                emitter: self.emitter.clone(),
                task_tx,
                task_rx: Arc::new(Mutex::new(task_rx)),
                result_tx,
                cancel: drain.clone(),
            },
        );

        while dataset.totals.terminal() < total {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("cancellation requested, returning partial dataset");
                    dataset.status = RunStatus::Cancelled;
                    break;
                }
                result = result_rx.recv() => match result {
                    Some(result) => self.absorb(&mut dataset, result),
                    None => {
                        error!("workers exited before the run completed");
                        dataset.status = RunStatus::Cancelled;
                        break;
                    }
                }
            }
        }

        drain.cancel();
        pool.shutdown().await;
        info!(
            completed = dataset.totals.completed,
            failed = dataset.totals.failed,
            rows = dataset.row_count(),
            "run finished"
        );
        dataset
    }

    /// The only place the dataset is mutated.
    fn absorb(&self, dataset: &mut AggregateDataset, result: TaskResult) {
        let TaskResult { game, outcome } = result;
        let phase = game.key.phase.clone();
        let game_id = game.game_id.clone();
        match outcome {
            TaskOutcome::Rows(rows, report) => {
                if !report.is_consistent {
                    warn!(
                        game = %game.key,
                        findings = report.discrepancies.len(),
                        "consistency check flagged game"
                    );
                }
                dataset.push_success(game, rows, report);
                self.emitter.record_completed();
                self.emitter.emit(&phase, &game_id, TaskStatus::Succeeded);
            }
            TaskOutcome::Error {
                kind,
                message,
                attempts,
            } => {
                dataset.push_failure(game, kind, message, attempts);
                self.emitter.record_failed();
                self.emitter.emit(&phase, &game_id, TaskStatus::Failed);
            }
        }
    }
}
