// DCA bot binary entry point

use anyhow::Context;
use common::aggregator::HttpAggregator;
use common::config::Settings;
use common::executor::SwapExecutor;
use common::registry::AssetRegistry;
use common::retry::{FixedDelay, RetryController, RetryStrategy};
use common::scheduler::SchedulerEngine;
use common::{telemetry, validator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration is loaded before logging so the log level can come from it;
    // a load failure surfaces on stderr through the anyhow return
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    telemetry::init_logging(&settings.observability.log_level)?;

    info!(
        trading_enabled = settings.trading.enabled,
        max_attempts = settings.trading.max_attempts,
        retry_delay_seconds = settings.trading.retry_delay_seconds,
        job_count = settings.jobs.len(),
        "Starting DCA swap bot"
    );
    if !settings.trading.enabled {
        warn!("Trading is not enabled; scheduled swaps will be skipped until APP__TRADING__ENABLED=true");
    }

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    // The asset registry snapshot is fetched once; failure here is fatal
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(
            settings.aggregator.request_timeout_seconds,
        ))
        .build()
        .context("Failed to build HTTP client")?;
    let registry = AssetRegistry::fetch(&http, &settings.registry)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to initialize asset registry");
            e
        })
        .context("Asset registry initialization failed")?;
    info!(asset_count = registry.len(), "Asset registry initialized");

    let jobs = validator::filter_jobs(&settings.jobs, &registry);
    if jobs.is_empty() {
        warn!("No schedulable jobs after validation");
    }

    let aggregator = Arc::new(HttpAggregator::new(settings.aggregator.clone())?);
    let executor = Arc::new(SwapExecutor::new(aggregator, &settings.trading));
    let strategy = Arc::new(FixedDelay::new(
        Duration::from_secs(settings.trading.retry_delay_seconds),
        settings.trading.max_attempts,
    )) as Arc<dyn RetryStrategy>;
    let controller = Arc::new(RetryController::new(executor, strategy));

    let engine = Arc::new(SchedulerEngine::new(jobs, controller));
    info!("Scheduler engine created");

    let engine_for_shutdown = Arc::clone(&engine);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, initiating shutdown");
            engine_for_shutdown.stop();
        }
    });

    engine.start().await;

    info!("Scheduler stopped");
    Ok(())
}
