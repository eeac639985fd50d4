//! Configurable CSS selectors for the site's markup.
//!
//! Defaults match the live-results site as of the 2024/2025 season.

use serde::{Deserialize, Serialize};

/// Selectors for the boxscore ("Ficha") page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxscoreSelectors {
    /// Element whose presence means the dynamic content has settled.
    pub readiness: String,
    pub home_team: String,
    pub away_team: String,
    pub table: String,
    pub team_body: String,
    /// Leading `tbody` elements carry quarter scores, not players.
    pub team_body_skip: usize,
    pub player_row: String,
    /// Rows carrying this class are team totals, not players.
    pub total_row_class: String,
    pub starter: String,
    pub jersey: String,
    pub name: String,
    pub position: String,
    pub minutes: String,
    pub points: String,
    pub two_points: String,
    pub three_points: String,
    pub free_throws: String,
    pub offensive_rebounds: String,
    pub defensive_rebounds: String,
    pub assists: String,
    pub steals: String,
    pub blocks: String,
    pub turnovers: String,
    pub personal_fouls: String,
    pub technical_fouls: String,
}

impl Default for BoxscoreSelectors {
    fn default() -> Self {
        Self {
            readiness: "h1.titulo-modulo + .responsive-scroll table tbody tr".into(),
            home_team: ".box-marcador .columna.equipo.local .nombre a".into(),
            away_team: ".box-marcador .columna.equipo.visitante .nombre a".into(),
            table: "h1.titulo-modulo + .responsive-scroll table".into(),
            team_body: "tbody".into(),
            team_body_skip: 2,
            player_row: "tr".into(),
            total_row_class: "row-total".into(),
            starter: "td.inicial".into(),
            jersey: "td.dorsal".into(),
            name: "td.nombre a".into(),
            position: "td.posicion".into(),
            minutes: "td.minutos".into(),
            points: "td.puntos".into(),
            two_points: "td.tiros.dos".into(),
            three_points: "td.tiros.tres".into(),
            free_throws: "td.tiros.libres".into(),
            offensive_rebounds: "td.rebotes.ofensivos".into(),
            defensive_rebounds: "td.rebotes.defensivos".into(),
            assists: "td.asistencias".into(),
            steals: "td.recuperaciones".into(),
            blocks: "td.tapones".into(),
            turnovers: "td.perdidas".into(),
            personal_fouls: "td.faltas.cometidas".into(),
            technical_fouls: "td.faltas.tecnicas".into(),
        }
    }
}

/// Selectors for the per-phase schedule page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSelectors {
    /// Element whose presence means the grid has rendered.
    pub readiness: String,
    pub matchday_select: String,
    pub matchday_option: String,
    pub grid: String,
    pub row: String,
    /// Both team anchors live in the first cell, home first.
    pub teams_cell: String,
    /// The result anchor carries the game id in its href (`p=<id>`).
    pub result_link: String,
}

impl Default for ScheduleSelectors {
    fn default() -> Self {
        Self {
            readiness: "table[id$='jornadaDataGrid'] tr".into(),
            matchday_select: "select[id$='jornadasDropDownList']".into(),
            matchday_option: "option".into(),
            grid: "table[id$='jornadaDataGrid']".into(),
            row: "tr".into(),
            teams_cell: "td:nth-child(1) a".into(),
            result_link: "td:nth-child(2) a".into(),
        }
    }
}
