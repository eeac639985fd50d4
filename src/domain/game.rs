//! Games, phases and the task/result types flowing through the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::boxscore::BoxscoreRow;
use crate::domain::validation::ValidationReport;

/// A competition phase with its resolved schedule.
///
/// Immutable once schedule discovery has run; the engine only ever reads it.
#[derive(Debug, Clone)]
pub struct Phase {
    /// Display label as the site shows it, e.g. `Liga Regular "B-A"`.
    pub label: String,
    /// Short code used in keys and file names, e.g. `B-A`.
    pub code: String,
    /// Games in schedule order (matchday, then grid order).
    pub games: Vec<Game>,
}

impl Phase {
    pub fn new(label: impl Into<String>, code: impl Into<String>, games: Vec<Game>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
            games,
        }
    }
}

/// Composite identity of a single game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameKey {
    pub season: String,
    pub phase: String,
    /// 1-based matchday within the phase.
    pub matchday: u32,
    pub home: String,
    pub away: String,
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} j{} {} vs {}",
            self.season, self.phase, self.matchday, self.home, self.away
        )
    }
}

/// Lifecycle of a game within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

/// One game to scrape: identity plus the boxscore page URL.
#[derive(Debug, Clone)]
pub struct Game {
    pub key: GameKey,
    /// Site-assigned game id extracted from the schedule grid.
    pub game_id: String,
    pub url: String,
    pub status: GameStatus,
}

impl Game {
    pub fn new(key: GameKey, game_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key,
            game_id: game_id.into(),
            url: url.into(),
            status: GameStatus::Pending,
        }
    }
}

/// Coarse classification of task failures, driving the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Network/timeout/not-yet-rendered; worth retrying.
    Transient,
    /// Session or configuration level; retrying the same URL cannot help.
    Fatal,
    /// Page fetched but its structure was not the expected one.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transient => write!(f, "transient"),
            ErrorKind::Fatal => write!(f, "fatal"),
            ErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Unit of scheduled work. Owned by exactly one worker while in flight;
/// goes back on the queue (with a bumped attempt count) on transient failure.
#[derive(Debug, Clone)]
pub struct ScrapeTask {
    pub game: Game,
    /// Number of attempts already consumed; 0 for a fresh task.
    pub attempt: u32,
}

impl ScrapeTask {
    pub fn new(game: Game) -> Self {
        Self { game, attempt: 0 }
    }

    /// The task as it should be requeued after a failed attempt.
    pub fn bump(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// Terminal outcome of a task.
#[derive(Debug)]
pub enum TaskOutcome {
    Rows(Vec<BoxscoreRow>, ValidationReport),
    Error {
        kind: ErrorKind,
        message: String,
        /// Attempts consumed before giving up.
        attempts: u32,
    },
}

/// Exactly one of these reaches the aggregator per enumerated task.
#[derive(Debug)]
pub struct TaskResult {
    pub game: Game,
    pub outcome: TaskOutcome,
}
