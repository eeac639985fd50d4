//! Tabular serialization of the aggregated dataset.

use std::path::Path;

use thiserror::Error;

use crate::domain::AggregateDataset;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

const HEADER: [&str; 27] = [
    "SEASON",
    "PHASE",
    "MATCHDAY",
    "GAME_ID",
    "TEAM",
    "OPPONENT",
    "SIDE",
    "PLAYER",
    "JERSEY",
    "POSITION",
    "STARTER",
    "MINUTES",
    "POINTS",
    "FG2_MADE",
    "FG2_ATT",
    "FG3_MADE",
    "FG3_ATT",
    "FT_MADE",
    "FT_ATT",
    "OFF_REB",
    "DEF_REB",
    "ASSISTS",
    "STEALS",
    "BLOCKS",
    "TURNOVERS",
    "PERSONAL_FOULS",
    "TECHNICAL_FOULS",
];

/// `boxscores_{season}_{phase list}.csv`, with the season collapsed to its
/// short form (`2024/2025` -> `24_25`).
pub fn dataset_filename(season: &str, phase_codes: &[String]) -> String {
    format!(
        "boxscores_{}_{}.csv",
        season_short(season),
        phase_codes.join("-")
    )
}

/// `"2024/2025"` -> `"24_25"`; anything else is passed through with
/// path-hostile characters replaced.
pub fn season_short(season: &str) -> String {
    if let Some((start, end)) = season.split_once('/') {
        if start.len() == 4 && end.len() == 4 {
            return format!("{}_{}", &start[2..], &end[2..]);
        }
    }
    season.replace(['/', '\\', ' '], "_")
}

/// Write one row per player per game. Row order follows the dataset, i.e.
/// completion order.
pub fn write_csv(dataset: &AggregateDataset, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for game in &dataset.games {
        for row in &game.rows {
            let opponent = if row.team == game.key.home {
                &game.key.away
            } else {
                &game.key.home
            };
            let record: Vec<String> = vec![
                game.key.season.clone(),
                game.key.phase.clone(),
                game.key.matchday.to_string(),
                game.game_id.clone(),
                row.team.clone(),
                opponent.clone(),
                row.side.as_str().to_string(),
                row.name.clone(),
                row.jersey.clone(),
                row.position.clone().unwrap_or_default(),
                String::from(if row.starter { "1" } else { "0" }),
                row.minutes_display(),
                row.points.to_string(),
                row.two_points.made.to_string(),
                row.two_points.attempted.to_string(),
                row.three_points.made.to_string(),
                row.three_points.attempted.to_string(),
                row.free_throws.made.to_string(),
                row.free_throws.attempted.to_string(),
                row.offensive_rebounds.to_string(),
                row.defensive_rebounds.to_string(),
                row.assists.to_string(),
                row.steals.to_string(),
                row.blocks.to_string(),
                row.turnovers.to_string(),
                row.personal_fouls.to_string(),
                row.technical_fouls.to_string(),
            ];
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}
