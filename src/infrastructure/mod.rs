//! Infrastructure module - everything that touches the outside world
//!
//! Browser sessions, HTML parsing, retry policy, logging and dataset
//! export live here, behind trait seams the engine consumes.

pub mod export;
pub mod logging;
pub mod page_client;
pub mod parsing;
pub mod retry;

pub use page_client::{
    FetchError, PageClient, PageClientFactory, RawPage, ReadinessProbe, WebDriverClient,
    WebDriverFactory,
};
pub use parsing::{BoxscoreParser, ParseError, ScheduleParser};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
