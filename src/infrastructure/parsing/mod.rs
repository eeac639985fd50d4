//! HTML extraction for the two page shapes the engine visits.
//!
//! Parsers are pure functions over page source with compiled CSS selectors;
//! every structural assumption that can fail yields a typed [`ParseError`]
//! instead of a panic. Selector strings live in configuration so a markup
//! change is a config edit, not a code change.

pub mod boxscore_parser;
pub mod error;
pub mod schedule_parser;
pub mod selectors;

pub use boxscore_parser::BoxscoreParser;
pub use error::{ParseError, ParseResult};
pub use schedule_parser::{ScheduleParser, ScheduledGame};
pub use selectors::{BoxscoreSelectors, ScheduleSelectors};

use scraper::Selector;

/// Compile one configured selector string.
pub(crate) fn compile(selector: &str) -> ParseResult<Selector> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
