//! Application configuration.
//!
//! Loaded from a TOML file merged with `FEB_`-prefixed environment
//! variables; every field has a default so a missing file still yields a
//! runnable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::domain::ValidationConfig;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::parsing::{BoxscoreSelectors, ScheduleSelectors};
use crate::infrastructure::retry::RetryConfig;

/// Complete configuration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub engine: EngineConfig,
    pub retry: RetryConfig,
    pub validation: ValidationConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// One selectable competition phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Label as the site shows it.
    pub label: String,
    /// Short code used in keys and file names.
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Season as the site labels it, e.g. `2024/2025`.
    pub season: String,
    pub phases: Vec<PhaseConfig>,
    /// Optional subset of matchdays; all of them when absent.
    pub matchdays: Option<Vec<u32>>,
    pub webdriver_url: String,
    pub headless: bool,
    /// Template with `{phase}`, `{year}` and `{matchday}` placeholders.
    pub schedule_url: String,
    /// Template with a `{game_id}` placeholder.
    pub boxscore_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            season: "2024/2025".to_string(),
            phases: vec![
                PhaseConfig {
                    label: "Liga Regular \"B-A\"".to_string(),
                    code: "B-A".to_string(),
                },
                PhaseConfig {
                    label: "Liga Regular \"B-B\"".to_string(),
                    code: "B-B".to_string(),
                },
            ],
            matchdays: None,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            schedule_url:
                "https://baloncestoenvivo.feb.es/resultados/tercerafeb/{phase}/{year}?jornada={matchday}"
                    .to_string(),
            boxscore_url: "https://baloncestoenvivo.feb.es/partido/{game_id}".to_string(),
        }
    }
}

impl SiteConfig {
    /// First calendar year of the season, used in schedule URLs.
    fn season_year(&self) -> &str {
        self.season.split('/').next().unwrap_or(&self.season)
    }

    pub fn schedule_url_for(&self, phase_code: &str, matchday: u32) -> String {
        self.schedule_url
            .replace("{phase}", phase_code)
            .replace("{year}", self.season_year())
            .replace("{matchday}", &matchday.to_string())
    }

    pub fn boxscore_url_for(&self, game_id: &str) -> String {
        self.boxscore_url.replace("{game_id}", game_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Concurrent browser sessions.
    pub workers: usize,
    /// Upper bound on one fetch, including the settle wait.
    pub fetch_timeout_ms: u64,
    /// How often the page source is re-checked while settling.
    pub poll_interval_ms: u64,
    /// Navigations per second across the whole pool.
    pub nav_per_second: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            fetch_timeout_ms: 15_000,
            poll_interval_ms: 500,
            nav_per_second: 2,
        }
    }
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub boxscore: BoxscoreSelectors,
    pub schedule: ScheduleSelectors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl AppConfig {
    /// Load from the given file (or `scraper.toml` in the working directory
    /// when none is given), then apply `FEB_`-prefixed environment
    /// overrides (`FEB_ENGINE__WORKERS=8`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        builder = match path {
            Some(p) => builder.add_source(File::from(p)),
            None => builder.add_source(File::with_name("scraper").required(false)),
        };
        builder = builder.add_source(Environment::with_prefix("FEB").separator("__"));
        builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("deserializing configuration")
    }

    pub fn phase_codes(&self) -> Vec<String> {
        self.site.phases.iter().map(|p| p.code.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_cover_two_regular_season_groups() {
        let config = AppConfig::default();
        assert_eq!(config.phase_codes(), vec!["B-A", "B-B"]);
        assert_eq!(config.engine.workers, 4);
        assert!(config.site.matchdays.is_none());
    }

    #[test]
    fn url_templates_substitute_placeholders() {
        let site = SiteConfig::default();
        let url = site.schedule_url_for("B-A", 7);
        assert!(url.contains("/B-A/2024"));
        assert!(url.ends_with("jornada=7"));
        assert_eq!(
            site.boxscore_url_for("2413725"),
            "https://baloncestoenvivo.feb.es/partido/2413725"
        );
    }

    #[test]
    fn file_overrides_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[engine]\nworkers = 9\n\n[site]\nseason = \"2025/2026\"\nmatchdays = [1, 2, 3]"
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.engine.workers, 9);
        assert_eq!(config.site.season, "2025/2026");
        assert_eq!(config.site.matchdays, Some(vec![1, 2, 3]));
        // Untouched sections keep their defaults.
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.validation.regulation_minutes, 40);
    }
}
