//! Typed parsing failures.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// A page was fetched and settled, but its structure was not the expected
/// one. Distinct from fetch errors: retrying the same URL only helps if the
/// page was still loading, which the caller rules out separately.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("scoreboard header not found")]
    ScoreboardMissing,

    #[error("boxscore table not found (looked for `{selector}`)")]
    TableMissing { selector: String },

    #[error("expected two team sections in the boxscore table, found {found}")]
    TeamSectionsMissing { found: usize },

    #[error("no player rows in the {team} section")]
    NoPlayerRows { team: String },

    #[error("required cell `{field}` missing in player row {index}")]
    CellMissing { field: String, index: usize },

    #[error("schedule grid not found (looked for `{selector}`)")]
    ScheduleMissing { selector: String },

    #[error("matchday selector not found (looked for `{selector}`)")]
    MatchdaySelectMissing { selector: String },
}
