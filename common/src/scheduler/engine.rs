// Scheduler engine implementation
//
// One tokio timer task per job. Each firing spawns the invocation as an
// independent task, so a slow run never delays or skips the next firing of
// the same or any other job (allow-overlap policy). Invocations are
// correlated in logs by a per-invocation UUID.

use crate::models::{InvocationOutcome, ResolvedJob};
use crate::retry::RetryController;
use crate::schedule;
use crate::telemetry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn, Instrument};
use uuid::Uuid;

pub struct SchedulerEngine {
    jobs: Vec<ResolvedJob>,
    controller: Arc<RetryController>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SchedulerEngine {
    pub fn new(jobs: Vec<ResolvedJob>, controller: Arc<RetryController>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

        Self {
            jobs,
            controller,
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Spawn one timer task per job and run until a shutdown signal
    #[instrument(skip(self))]
    pub async fn start(&self) {
        info!(job_count = self.jobs.len(), "Starting scheduler engine");

        for job in &self.jobs {
            tokio::spawn(run_job_timer(
                job.clone(),
                Arc::clone(&self.controller),
                self.shutdown_receiver(),
            ));
        }

        let mut shutdown_rx = self.shutdown_receiver();
        let _ = shutdown_rx.recv().await;
        info!("Shutdown signal received, scheduler engine stopped");
    }

    /// Signal all timer tasks to stop. In-flight invocations run to
    /// completion; only the triggers are torn down.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Per-job timer loop: sleep to the next occurrence, spawn the invocation,
/// re-arm immediately
async fn run_job_timer(
    job: ResolvedJob,
    controller: Arc<RetryController>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let now = Utc::now();
        let next = match schedule::next_occurrence(&job.spec.schedule, job.spec.timezone, now) {
            Ok(next) => next,
            Err(e) => {
                // The expression was validated at startup; reaching this means
                // it has no future firings left (e.g. a year-bounded schedule)
                error!(
                    job = %job.spec.name,
                    error = %e,
                    "No further occurrences, stopping trigger"
                );
                return;
            }
        };

        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(job = %job.spec.name, next = %next, "Trigger armed");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let controller = Arc::clone(&controller);
                let job = job.clone();
                tokio::spawn(async move {
                    run_invocation(job, controller).await;
                });
            }
            _ = shutdown_rx.recv() => {
                debug!(job = %job.spec.name, "Trigger stopped");
                return;
            }
        }
    }
}

/// Drive one invocation to completion and convert its outcome to logs and
/// metrics. Nothing propagates out of here; a failing job cannot affect
/// another job or the scheduler itself.
async fn run_invocation(job: ResolvedJob, controller: Arc<RetryController>) {
    let invocation_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "swap_invocation",
        job = %job.spec.name,
        %invocation_id
    );

    let started = std::time::Instant::now();
    let outcome = controller.run(&job).instrument(span).await;
    telemetry::record_swap_duration(&job.spec.name, started.elapsed().as_secs_f64());

    match outcome {
        InvocationOutcome::Filled { receipt, attempts } => {
            telemetry::record_swap_success(&job.spec.name);
            info!(
                job = %job.spec.name,
                %invocation_id,
                attempts,
                amount_in = %receipt.amount_in,
                amount_out = %receipt.amount_out,
                tx_ref = %receipt.tx_ref,
                "Invocation filled"
            );
        }
        InvocationOutcome::Exhausted { attempts } => {
            telemetry::record_swap_failure(&job.spec.name, "exhausted");
            warn!(
                job = %job.spec.name,
                %invocation_id,
                attempts,
                "Invocation exhausted its attempt budget"
            );
        }
        InvocationOutcome::Disabled => {
            telemetry::record_swap_skipped(&job.spec.name);
        }
        InvocationOutcome::Aborted { attempts, error } => {
            telemetry::record_swap_failure(&job.spec.name, "aborted");
            error!(
                job = %job.spec.name,
                %invocation_id,
                attempts,
                error = %error,
                "Invocation aborted on unexpected error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::config::TradingConfig;
    use crate::errors::AggregatorError;
    use crate::executor::SwapExecutor;
    use crate::models::{ExecutionResult, Route, RouteRequest};
    use crate::retry::{FixedDelay, RetryStrategy};
    use async_trait::async_trait;

    struct NullAggregator;

    #[async_trait]
    impl Aggregator for NullAggregator {
        async fn compute_route(
            &self,
            _request: &RouteRequest,
        ) -> Result<Option<Route>, AggregatorError> {
            Ok(None)
        }

        async fn execute(&self, _route: &Route) -> Result<ExecutionResult, AggregatorError> {
            Ok(ExecutionResult::Failed {
                error: "unreachable".to_string(),
            })
        }
    }

    fn controller() -> Arc<RetryController> {
        let trading = TradingConfig {
            enabled: false,
            max_attempts: 1,
            retry_delay_seconds: 1,
        };
        let executor = Arc::new(SwapExecutor::new(Arc::new(NullAggregator), &trading));
        let strategy =
            Arc::new(FixedDelay::new(Duration::from_secs(1), 1)) as Arc<dyn RetryStrategy>;
        Arc::new(RetryController::new(executor, strategy))
    }

    #[tokio::test]
    async fn test_stop_releases_start() {
        let engine = Arc::new(SchedulerEngine::new(Vec::new(), controller()));

        let engine_for_start = Arc::clone(&engine);
        let handle = tokio::spawn(async move { engine_for_start.start().await });

        // Give start a moment to subscribe, then signal shutdown
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("engine did not stop after shutdown signal")
            .expect("engine task panicked");
    }
}
