// Schedule expression parsing and occurrence calculation
//
// Pure functions over cron expressions, reusable by the validator without a
// live scheduler. The trigger mechanism itself lives in the scheduler module.

use crate::errors::ScheduleError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Next occurrence strictly after `after`, evaluated in `timezone` and
/// returned in UTC
pub fn next_occurrence(
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;
    let after_in_tz = after.with_timezone(&timezone);

    let next_in_tz =
        schedule
            .after(&after_in_tz)
            .next()
            .ok_or_else(|| ScheduleError::NoUpcomingOccurrence {
                expression: expression.to_string(),
            })?;

    Ok(next_in_tz.with_timezone(&Utc))
}

/// Human-readable description of a schedule for startup logging: the next
/// couple of occurrences, formatted in the job's timezone
pub fn describe(expression: &str, timezone: Tz) -> Result<String, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;
    let now = Utc::now().with_timezone(&timezone);

    let upcoming: Vec<String> = schedule
        .after(&now)
        .take(2)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .collect();

    if upcoming.is_empty() {
        return Err(ScheduleError::NoUpcomingOccurrence {
            expression: expression.to_string(),
        });
    }

    Ok(format!("next at {}", upcoming.join(", then at ")))
}

/// Default timezone for job schedules
pub fn default_timezone() -> Tz {
    chrono_tz::UTC
}
