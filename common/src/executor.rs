// Swap executor: exactly one swap attempt for a resolved job

use crate::aggregator::Aggregator;
use crate::config::TradingConfig;
use crate::errors::SwapError;
use crate::models::{ExecutionResult, ResolvedJob, RouteRequest, SwapAttempt, SwapReceipt};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SwapExecutor {
    aggregator: Arc<dyn Aggregator>,
    trading_enabled: bool,
}

impl SwapExecutor {
    pub fn new(aggregator: Arc<dyn Aggregator>, trading: &TradingConfig) -> Self {
        Self {
            aggregator,
            trading_enabled: trading.enabled,
        }
    }

    /// Attempt exactly one swap. Business-level failures come back as
    /// `SwapAttempt` variants; transport-level failures as `Err`. When trading
    /// is disabled the aggregator is never reached.
    pub async fn attempt(&self, job: &ResolvedJob) -> Result<SwapAttempt, SwapError> {
        if !self.trading_enabled {
            return Ok(SwapAttempt::Disabled);
        }

        let amount = job.input.to_base_units(job.spec.amount).ok_or_else(|| {
            SwapError::AmountOutOfRange {
                amount: job.spec.amount.to_string(),
                decimals: job.input.decimals,
            }
        })?;

        let request = RouteRequest {
            input_address: job.input.address.clone(),
            output_address: job.output.address.clone(),
            amount,
            slippage_bps: job.spec.slippage_bps,
        };

        let Some(route) = self.aggregator.compute_route(&request).await? else {
            debug!(job = %job.spec.name, "Aggregator returned no route");
            return Ok(SwapAttempt::NoRoute);
        };

        debug!(
            job = %job.spec.name,
            quoted_out = route.quoted_out,
            "Route found, submitting for execution"
        );

        match self.aggregator.execute(&route).await? {
            ExecutionResult::Confirmed {
                input_amount,
                output_amount,
                tx_ref,
            } => {
                let amount_in = job.input.from_base_units(input_amount).ok_or_else(|| {
                    SwapError::AmountOutOfRange {
                        amount: input_amount.to_string(),
                        decimals: job.input.decimals,
                    }
                })?;
                let amount_out = job.output.from_base_units(output_amount).ok_or_else(|| {
                    SwapError::AmountOutOfRange {
                        amount: output_amount.to_string(),
                        decimals: job.output.decimals,
                    }
                })?;

                info!(
                    job = %job.spec.name,
                    amount_in = %amount_in,
                    input = %job.input.symbol,
                    amount_out = %amount_out,
                    output = %job.output.symbol,
                    tx_ref = %tx_ref,
                    "Swap confirmed"
                );

                Ok(SwapAttempt::Filled(SwapReceipt {
                    amount_in,
                    amount_out,
                    tx_ref,
                }))
            }
            ExecutionResult::Failed { error } => {
                warn!(job = %job.spec.name, error = %error, "Swap execution reported an error");
                Ok(SwapAttempt::Rejected { reason: error })
            }
        }
    }
}
