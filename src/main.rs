//! CLI runner: load configuration, discover the schedule, run the engine,
//! write the dataset and print the failure report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use feb_boxscores::application::{AppConfig, ProgressEmitter, ScheduleDiscovery, ScrapeEngine};
use feb_boxscores::infrastructure::export::{dataset_filename, write_csv};
use feb_boxscores::infrastructure::logging::init_logging;
use feb_boxscores::infrastructure::page_client::{PageClientFactory, WebDriverFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    init_logging(&config.logging)?;
    info!(
        season = %config.site.season,
        phases = config.site.phases.len(),
        "feb-boxscores starting"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("ctrl-c received, cancelling run");
                cancel.cancel();
            }
        });
    }

    let factory: Arc<dyn PageClientFactory> = Arc::new(WebDriverFactory::new(
        config.site.webdriver_url.clone(),
        config.site.headless,
        config.engine.fetch_timeout(),
        config.engine.poll_interval(),
        config.engine.nav_per_second,
    )?);

    // Schedule discovery runs on a session of its own.
    let discovery = ScheduleDiscovery::from_config(&config)?;
    let mut client = factory
        .create()
        .await
        .context("starting discovery session")?;
    let phases = discovery.resolve_phases(client.as_mut(), &config).await;
    client.close().await;
    let phases = phases.context("resolving phase schedules")?;
    let total: usize = phases.iter().map(|p| p.games.len()).sum();
    info!(total, "schedule discovery finished");

    // Stand-in for the external progress display: log each event.
    let (emitter, mut progress) = ProgressEmitter::channel(Uuid::new_v4());
    let reporter = tokio::spawn(async move {
        while let Some(event) = progress.next().await {
            info!(
                phase = %event.phase,
                game = %event.game_id,
                status = ?event.status,
                completed = event.totals.completed,
                failed = event.totals.failed,
                total = event.totals.total,
                "progress"
            );
        }
    });

    let engine = ScrapeEngine::from_config(&config, factory, emitter, cancel.clone())?;
    let dataset = engine.run(&phases).await;
    drop(engine);
    let _ = reporter.await;

    for failure in &dataset.failures {
        warn!(
            game = %failure.key,
            kind = %failure.error_kind,
            attempts = failure.attempts,
            "game permanently failed: {}",
            failure.message
        );
    }
    for flagged in dataset.flagged_games() {
        warn!(
            game = %flagged.key,
            "consistency findings: {}",
            flagged.report.discrepancies.join("; ")
        );
    }

    let filename = dataset_filename(&config.site.season, &config.phase_codes());
    let path = config.output.dir.join(filename);
    write_csv(&dataset, &path).with_context(|| format!("writing {}", path.display()))?;
    info!(
        rows = dataset.row_count(),
        games = dataset.games.len(),
        failures = dataset.failures.len(),
        status = ?dataset.status,
        output = %path.display(),
        "dataset written"
    );
    Ok(())
}
