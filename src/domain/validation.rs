//! Per-game statistical consistency checks.
//!
//! A violation is a flag, never a rejection: inconsistent games stay in the
//! dataset so data-quality issues are visible instead of silently dropped.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::boxscore::{BoxscoreRow, TeamSide};

/// Tolerances of the minutes reconciliation. All of this is configuration;
/// the right thresholds vary per league and are not hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Regulation game length in minutes.
    pub regulation_minutes: u64,
    /// Length of one overtime period in minutes.
    pub overtime_minutes: u64,
    /// Players on court simultaneously per team.
    pub players_on_court: u32,
    /// Accepted deviation of a team's summed minutes, in seconds.
    pub tolerance_seconds: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            regulation_minutes: 40,
            overtime_minutes: 5,
            players_on_court: 5,
            tolerance_seconds: 60,
        }
    }
}

/// Outcome of validating one game's rows.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_consistent: bool,
    pub discrepancies: Vec<String>,
}

impl ValidationReport {
    fn from_findings(discrepancies: Vec<String>) -> Self {
        Self {
            is_consistent: discrepancies.is_empty(),
            discrepancies,
        }
    }
}

/// Checks one game's rows for internal and cross-row consistency.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    config: ValidationConfig,
}

impl ConsistencyValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate all rows of a single game.
    pub fn validate(&self, rows: &[BoxscoreRow]) -> ValidationReport {
        let mut findings = Vec::new();

        if rows.is_empty() {
            findings.push("no player rows to validate".to_string());
            return ValidationReport::from_findings(findings);
        }

        for row in rows {
            if !row.two_points.is_consistent()
                || !row.three_points.is_consistent()
                || !row.free_throws.is_consistent()
            {
                findings.push(format!(
                    "{} ({}): made shots exceed attempts",
                    row.name, row.team
                ));
            } else if row.points != row.points_from_shots() {
                findings.push(format!(
                    "{} ({}): reported {} points, made shots add up to {}",
                    row.name,
                    row.team,
                    row.points,
                    row.points_from_shots()
                ));
            }
        }

        for side in [TeamSide::Home, TeamSide::Away] {
            self.check_team_minutes(rows, side, &mut findings);
        }

        ValidationReport::from_findings(findings)
    }

    /// Sum of one team's player minutes must reconcile with
    /// `players_on_court x regulation`, allowing whole overtime blocks.
    fn check_team_minutes(&self, rows: &[BoxscoreRow], side: TeamSide, findings: &mut Vec<String>) {
        let team_rows: Vec<&BoxscoreRow> = rows.iter().filter(|r| r.side == side).collect();
        let Some(first) = team_rows.first() else {
            findings.push(format!("no rows for {} team", side.as_str()));
            return;
        };
        let team = first.team.clone();

        let total: Duration = team_rows.iter().map(|r| r.minutes).sum();
        let expected = Duration::from_secs(
            u64::from(self.config.players_on_court) * self.config.regulation_minutes * 60,
        );
        let tolerance = Duration::from_secs(self.config.tolerance_seconds);

        if total + tolerance < expected {
            findings.push(format!(
                "{}: {} player-minutes recorded, expected at least {} (regulation)",
                team,
                fmt_minutes(total),
                fmt_minutes(expected)
            ));
            return;
        }

        if total > expected + tolerance {
            // Anything beyond regulation must be whole overtime blocks.
            let over = (total - expected).as_secs();
            let block = u64::from(self.config.players_on_court) * self.config.overtime_minutes * 60;
            let remainder = over % block;
            let distance = remainder.min(block - remainder);
            if distance > self.config.tolerance_seconds {
                findings.push(format!(
                    "{}: {} player-minutes recorded, {} above regulation and not on an overtime boundary",
                    team,
                    fmt_minutes(total),
                    fmt_minutes(Duration::from_secs(over))
                ));
            }
        }
    }
}

fn fmt_minutes(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
