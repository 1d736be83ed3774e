// Job validation: produce the schedulable subset of the configured jobs

use crate::models::{ResolvedJob, SwapJob};
use crate::registry::AssetRegistry;
use crate::schedule;
use tracing::{info, warn};

/// Filter the configured jobs down to the schedulable subset. A job is
/// accepted iff its cron expression parses and both asset symbols resolve in
/// the registry. Rejected jobs are logged and omitted; rejection is never
/// fatal and has no other side effect.
pub fn filter_jobs(jobs: &[SwapJob], registry: &AssetRegistry) -> Vec<ResolvedJob> {
    let mut accepted = Vec::with_capacity(jobs.len());

    for job in jobs {
        if let Err(e) = schedule::parse_cron_expression(&job.schedule) {
            warn!(job = %job.name, error = %e, "Excluding job: invalid schedule expression");
            continue;
        }

        let Some(input) = registry.resolve(&job.input) else {
            warn!(
                job = %job.name,
                symbol = %job.input,
                "Excluding job: input asset does not resolve"
            );
            continue;
        };
        let Some(output) = registry.resolve(&job.output) else {
            warn!(
                job = %job.name,
                symbol = %job.output,
                "Excluding job: output asset does not resolve"
            );
            continue;
        };

        let when = schedule::describe(&job.schedule, job.timezone)
            .unwrap_or_else(|_| "no upcoming occurrence".to_string());
        info!(
            job = %job.name,
            amount = %job.amount,
            input = %job.input,
            output = %job.output,
            slippage_bps = job.slippage_bps,
            schedule = %job.schedule,
            "Scheduling swap, {when}"
        );

        accepted.push(ResolvedJob {
            spec: job.clone(),
            input: input.clone(),
            output: output.clone(),
        });
    }

    accepted
}
