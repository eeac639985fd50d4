//! The aggregated output of a run.
//!
//! The dataset is owned exclusively by the aggregator; workers only ever
//! produce values that are handed to it over the result channel.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::boxscore::BoxscoreRow;
use crate::domain::events::{RunStatus, RunTotals};
use crate::domain::game::{ErrorKind, Game, GameKey};
use crate::domain::validation::ValidationReport;

/// All rows of one successfully scraped game plus its consistency report.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub key: GameKey,
    pub game_id: String,
    pub rows: Vec<BoxscoreRow>,
    pub report: ValidationReport,
}

/// A game that exhausted its retries (or failed fatally).
#[derive(Debug, Clone, Serialize)]
pub struct FailedGame {
    pub key: GameKey,
    pub game_id: String,
    pub error_kind: ErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// Append-only collection of everything a run produced.
///
/// Row order follows completion order, not enumeration order; consumers key
/// records by [`GameKey`] or sort afterwards.
#[derive(Debug, Serialize)]
pub struct AggregateDataset {
    pub run_id: Uuid,
    pub season: String,
    pub status: RunStatus,
    pub totals: RunTotals,
    pub games: Vec<GameRecord>,
    pub failures: Vec<FailedGame>,
}

impl AggregateDataset {
    pub fn new(run_id: Uuid, season: impl Into<String>, total: u32) -> Self {
        Self {
            run_id,
            season: season.into(),
            status: RunStatus::Completed,
            totals: RunTotals {
                total,
                ..RunTotals::default()
            },
            games: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn push_success(&mut self, game: Game, rows: Vec<BoxscoreRow>, report: ValidationReport) {
        self.totals.completed += 1;
        self.games.push(GameRecord {
            key: game.key,
            game_id: game.game_id,
            rows,
            report,
        });
    }

    pub fn push_failure(&mut self, game: Game, kind: ErrorKind, message: String, attempts: u32) {
        self.totals.failed += 1;
        self.failures.push(FailedGame {
            key: game.key,
            game_id: game.game_id,
            error_kind: kind,
            message,
            attempts,
        });
    }

    /// Games whose consistency check recorded at least one discrepancy.
    pub fn flagged_games(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.iter().filter(|g| !g.report.is_consistent)
    }

    pub fn row_count(&self) -> usize {
        self.games.iter().map(|g| g.rows.len()).sum()
    }
}
