//! One player's stat line for one game.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Made/attempted pair for one shooting category.
///
/// The site encodes these as `"made/attempted"` cells; the parser coerces
/// them into this pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotLine {
    pub made: u32,
    pub attempted: u32,
}

impl ShotLine {
    pub fn new(made: u32, attempted: u32) -> Self {
        Self { made, attempted }
    }

    /// A shooting line can never convert more than it attempted.
    pub fn is_consistent(&self) -> bool {
        self.made <= self.attempted
    }
}

/// Which of the two team sections of the boxscore a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::Home => "home",
            TeamSide::Away => "away",
        }
    }
}

/// Full stat line of one player in one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxscoreRow {
    pub team: String,
    pub side: TeamSide,
    pub name: String,
    /// Kept as a string: "00" and "0" are different jerseys.
    pub jersey: String,
    /// Not every league publishes positions.
    pub position: Option<String>,
    pub starter: bool,
    pub minutes: Duration,
    pub two_points: ShotLine,
    pub three_points: ShotLine,
    pub free_throws: ShotLine,
    pub offensive_rebounds: u32,
    pub defensive_rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub personal_fouls: u32,
    pub technical_fouls: u32,
    pub points: u32,
}

impl BoxscoreRow {
    /// Points implied by the made shots alone.
    pub fn points_from_shots(&self) -> u32 {
        2 * self.two_points.made + 3 * self.three_points.made + self.free_throws.made
    }

    /// All three shooting lines internally consistent and the reported
    /// points matching the made shots.
    pub fn is_internally_consistent(&self) -> bool {
        self.two_points.is_consistent()
            && self.three_points.is_consistent()
            && self.free_throws.is_consistent()
            && self.points == self.points_from_shots()
    }

    /// Minutes formatted the way the site shows them, `MM:SS`.
    pub fn minutes_display(&self) -> String {
        let secs = self.minutes.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> BoxscoreRow {
        BoxscoreRow {
            team: "CB EGIDO".into(),
            side: TeamSide::Home,
            name: "A. PEREZ".into(),
            jersey: "7".into(),
            position: Some("Base".into()),
            starter: true,
            minutes: Duration::from_secs(28 * 60 + 30),
            two_points: ShotLine::new(4, 9),
            three_points: ShotLine::new(2, 5),
            free_throws: ShotLine::new(3, 4),
            offensive_rebounds: 1,
            defensive_rebounds: 4,
            assists: 6,
            steals: 2,
            blocks: 0,
            turnovers: 3,
            personal_fouls: 2,
            technical_fouls: 0,
            points: 17,
        }
    }

    #[test]
    fn points_derive_from_made_shots() {
        let row = sample_row();
        assert_eq!(row.points_from_shots(), 2 * 4 + 3 * 2 + 3);
        assert!(row.is_internally_consistent());
    }

    #[test]
    fn mismatched_points_are_inconsistent() {
        let mut row = sample_row();
        row.points = 20;
        assert!(!row.is_internally_consistent());
    }

    #[test]
    fn made_above_attempted_is_inconsistent() {
        let mut row = sample_row();
        row.free_throws = ShotLine::new(5, 4);
        assert!(!row.free_throws.is_consistent());
        assert!(!row.is_internally_consistent());
    }

    #[test]
    fn minutes_display_is_zero_padded() {
        let row = sample_row();
        assert_eq!(row.minutes_display(), "28:30");
    }
}
