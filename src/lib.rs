//! Concurrent player-boxscore extraction for the FEB live-results site.
//!
//! The site publishes one dynamically rendered boxscore page per game. This
//! crate discovers the schedule of the selected season and phases, fans the
//! games out over a pool of browser sessions, parses each page into typed
//! per-player rows, checks per-game statistical consistency, and merges
//! everything into one dataset with observable progress.
//!
//! Layering follows the usual split: [`domain`] is data and pure logic,
//! [`infrastructure`] touches the outside world, [`application`] wires the
//! two into the scheduler/worker-pool/aggregator pipeline.

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the main entry points
pub use application::{AppConfig, ProgressEmitter, ScheduleDiscovery, ScrapeEngine};
pub use domain::{AggregateDataset, RunStatus};
