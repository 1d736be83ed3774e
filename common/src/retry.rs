// Bounded retry with fixed inter-attempt delay

use crate::executor::SwapExecutor;
use crate::models::{InvocationOutcome, ResolvedJob, SwapAttempt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Retry strategy trait for calculating inter-attempt delays
pub trait RetryStrategy: Send + Sync {
    /// Delay before the next attempt, given the number of attempts already
    /// made; None once the attempt budget is spent
    fn next_delay(&self, attempts_made: u32) -> Option<Duration>;

    /// Total number of attempts allowed, including the first (>= 1)
    fn max_attempts(&self) -> u32;
}

/// Fixed delay between attempts with a bounded attempt count
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: u32,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        if attempts_made >= self.max_attempts {
            return None;
        }
        Some(self.delay)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Drives one scheduled invocation: attempt, wait, retry, up to the strategy's
/// attempt budget. Best-effort, not transactional: a transient failure and a
/// genuine lack of liquidity both just consume an attempt.
pub struct RetryController {
    executor: Arc<SwapExecutor>,
    strategy: Arc<dyn RetryStrategy>,
}

impl RetryController {
    pub fn new(executor: Arc<SwapExecutor>, strategy: Arc<dyn RetryStrategy>) -> Self {
        Self { executor, strategy }
    }

    /// Run one invocation to completion. Never returns early on a business
    /// failure while attempts remain; stops immediately on success, on the
    /// disabled switch, or on an unexpected error.
    pub async fn run(&self, job: &ResolvedJob) -> InvocationOutcome {
        let max_attempts = self.strategy.max_attempts();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            info!(
                job = %job.spec.name,
                attempt = attempts,
                max_attempts,
                "Swap attempt"
            );

            match self.executor.attempt(job).await {
                Ok(SwapAttempt::Filled(receipt)) => {
                    return InvocationOutcome::Filled { receipt, attempts };
                }
                Ok(SwapAttempt::Disabled) => {
                    info!(
                        job = %job.spec.name,
                        "Trading not enabled; skipping execution"
                    );
                    return InvocationOutcome::Disabled;
                }
                Ok(SwapAttempt::NoRoute) => {
                    warn!(job = %job.spec.name, attempt = attempts, "No route found");
                }
                Ok(SwapAttempt::Rejected { reason }) => {
                    warn!(
                        job = %job.spec.name,
                        attempt = attempts,
                        reason = %reason,
                        "Swap attempt rejected"
                    );
                }
                Err(e) => {
                    error!(
                        job = %job.spec.name,
                        attempt = attempts,
                        error = %e,
                        "Unexpected swap failure; aborting invocation"
                    );
                    return InvocationOutcome::Aborted {
                        attempts,
                        error: e.to_string(),
                    };
                }
            }

            match self.strategy.next_delay(attempts) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    warn!(
                        job = %job.spec.name,
                        attempts,
                        "Attempt budget exhausted without a fill"
                    );
                    return InvocationOutcome::Exhausted { attempts };
                }
            }
        }
    }
}
