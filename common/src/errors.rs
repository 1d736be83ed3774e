// Error handling framework

use thiserror::Error;

/// Schedule-expression errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("No upcoming occurrence for cron expression '{expression}'")]
    NoUpcomingOccurrence { expression: String },
}

/// Asset registry errors. The registry is built once at startup; any of these
/// is fatal to the process.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Token list request failed: {0}")]
    RequestFailed(String),

    #[error("Token list request returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Failed to decode token list snapshot: {0}")]
    MalformedSnapshot(String),
}

/// Transport-level aggregator errors. A structured "no route" or execution
/// failure is a result, not an error; these are the unexpected failures that
/// abort the retry loop for the current invocation.
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Aggregator request failed: {0}")]
    RequestFailed(String),

    #[error("Aggregator returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to decode aggregator response: {0}")]
    MalformedResponse(String),
}

/// Failures of a single swap attempt that are not structured business results
#[derive(Error, Debug)]
pub enum SwapError {
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),

    #[error("Amount {amount} is not representable with {decimals} decimals")]
    AmountOutOfRange { amount: String, decimals: u32 },
}

// Implement From for common external errors
impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::RequestFailed(err.to_string())
    }
}

impl From<reqwest::Error> for AggregatorError {
    fn from(err: reqwest::Error) -> Self {
        AggregatorError::RequestFailed(err.to_string())
    }
}
