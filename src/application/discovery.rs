//! Schedule discovery: configured phase labels into concrete game lists.
//!
//! Runs before the engine so the total task count is known up front. Uses
//! one page client of its own; transient fetch failures go through the same
//! retry policy as game fetches.

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::application::config::AppConfig;
use crate::domain::{Game, GameKey, Phase};
use crate::infrastructure::page_client::{FetchError, PageClient, RawPage, ReadinessProbe};
use crate::infrastructure::parsing::{ParseError, ScheduleParser};
use crate::infrastructure::retry::{RetryDecision, RetryPolicy};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub struct ScheduleDiscovery {
    parser: ScheduleParser,
    probe: ReadinessProbe,
    policy: RetryPolicy,
}

impl ScheduleDiscovery {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            parser: ScheduleParser::new(&config.selectors.schedule)?,
            probe: ReadinessProbe::css(&config.selectors.schedule.readiness)?,
            policy: RetryPolicy::new(config.retry.clone()),
        })
    }

    /// Resolve every configured phase into its full game list, in schedule
    /// order. Honors the optional matchday filter.
    pub async fn resolve_phases(
        &self,
        client: &mut dyn PageClient,
        config: &AppConfig,
    ) -> Result<Vec<Phase>, DiscoveryError> {
        let mut phases = Vec::with_capacity(config.site.phases.len());
        for phase in &config.site.phases {
            let first_url = config.site.schedule_url_for(&phase.code, 1);
            let first = self.fetch_with_retry(client, &first_url).await?;
            let total = self.parser.matchday_count(&first.html)?;
            info!(phase = %phase.code, matchdays = total, "phase schedule discovered");

            let mut games = Vec::new();
            for matchday in 1..=total {
                if let Some(filter) = &config.site.matchdays {
                    if !filter.contains(&matchday) {
                        continue;
                    }
                }
                let html = if matchday == 1 {
                    first.html.clone()
                } else {
                    let url = config.site.schedule_url_for(&phase.code, matchday);
                    self.fetch_with_retry(client, &url).await?.html
                };
                for scheduled in self.parser.parse_matchday(&html, matchday)? {
                    let key = GameKey {
                        season: config.site.season.clone(),
                        phase: phase.code.clone(),
                        matchday,
                        home: scheduled.home,
                        away: scheduled.away,
                    };
                    let url = config.site.boxscore_url_for(&scheduled.game_id);
                    games.push(Game::new(key, scheduled.game_id, url));
                }
                debug!(phase = %phase.code, matchday, "matchday parsed");
            }
            phases.push(Phase::new(phase.label.clone(), phase.code.clone(), games));
        }
        Ok(phases)
    }

    async fn fetch_with_retry(
        &self,
        client: &mut dyn PageClient,
        url: &str,
    ) -> Result<RawPage, FetchError> {
        let mut attempt = 0;
        loop {
            match client.fetch(url, &self.probe).await {
                Ok(page) => return Ok(page),
                Err(err) => match self.policy.decide(err.kind(), attempt) {
                    RetryDecision::Retry(delay) => {
                        warn!(url, error = %err, attempt, "schedule fetch failed, retrying");
                        sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => return Err(err),
                },
            }
        }
    }
}
