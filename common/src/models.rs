use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// Helper functions for Tz serialization
fn serialize_tz<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&tz.to_string())
}

fn deserialize_tz<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Tz::from_str(&s).map_err(serde::de::Error::custom)
}

// ============================================================================
// Assets & amounts
// ============================================================================

/// An asset resolved from the registry snapshot: chain address, display
/// symbol, and decimal precision. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
}

impl Asset {
    /// Convert a human-unit amount to this asset's smallest integer unit,
    /// rounded to the nearest unit. None when the amount is not representable.
    pub fn to_base_units(&self, amount: Decimal) -> Option<u128> {
        let scale = 10u128.checked_pow(self.decimals)?;
        let scaled = amount.checked_mul(Decimal::from(scale))?;
        scaled.round().to_u128()
    }

    /// Convert an amount in smallest units back to human units.
    pub fn from_base_units(&self, amount: u128) -> Option<Decimal> {
        let mantissa = i128::try_from(amount).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, self.decimals).ok()
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// A recurring swap intent as declared in configuration. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapJob {
    pub name: String,
    /// Cron expression with a seconds field, e.g. "0 0 9 * * *"
    pub schedule: String,
    /// Input asset symbol, resolved against the registry
    pub input: String,
    /// Output asset symbol, resolved against the registry
    pub output: String,
    /// Amount in human units of the input asset
    pub amount: Decimal,
    pub slippage_bps: u16,
    #[serde(
        default = "crate::schedule::default_timezone",
        serialize_with = "serialize_tz",
        deserialize_with = "deserialize_tz"
    )]
    pub timezone: Tz,
}

/// A SwapJob with both asset references resolved against the registry.
/// Derived at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ResolvedJob {
    pub spec: SwapJob,
    pub input: Asset,
    pub output: Asset,
}

// ============================================================================
// Routes & execution results
// ============================================================================

/// Route request handed to the aggregator, amounts in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub input_address: String,
    pub output_address: String,
    pub amount: u128,
    pub slippage_bps: u16,
}

/// An externally computed execution path for one (input, output, amount)
/// triple. The payload is opaque to this system and handed back verbatim on
/// execution; only the quoted output amount is interpreted, for logging.
#[derive(Debug, Clone)]
pub struct Route {
    /// Quoted output amount in the output asset's base units
    pub quoted_out: u128,
    pub payload: serde_json::Value,
}

/// Structured result of submitting a route, amounts in base units
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Confirmed {
        input_amount: u128,
        output_amount: u128,
        tx_ref: String,
    },
    Failed {
        error: String,
    },
}

/// Success payload of one executed swap, amounts in human units
#[derive(Debug, Clone)]
pub struct SwapReceipt {
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub tx_ref: String,
}

/// Outcome of one executor attempt
#[derive(Debug, Clone)]
pub enum SwapAttempt {
    Filled(SwapReceipt),
    /// The aggregator returned no path; failed but retryable
    NoRoute,
    /// The aggregator executed but reported a structured failure; retryable
    Rejected { reason: String },
    /// Trading is administratively disabled; consumes nothing
    Disabled,
}

/// Outcome of one scheduled invocation after the retry loop
#[derive(Debug, Clone)]
pub enum InvocationOutcome {
    Filled {
        receipt: SwapReceipt,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
    },
    Disabled,
    /// Unexpected error aborted the retry loop
    Aborted {
        attempts: u32,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset(decimals: u32) -> Asset {
        Asset {
            address: "So11111111111111111111111111111111111111112".to_string(),
            symbol: "SOL".to_string(),
            decimals,
        }
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(asset(6).to_base_units(dec!(1.5)), Some(1_500_000));
        assert_eq!(asset(9).to_base_units(dec!(0.000000001)), Some(1));
        assert_eq!(asset(0).to_base_units(dec!(42)), Some(42));
    }

    #[test]
    fn test_to_base_units_rounds_to_nearest() {
        // 1.0000004 at 6 decimals is below the half-unit boundary
        assert_eq!(asset(6).to_base_units(dec!(1.0000004)), Some(1_000_000));
        assert_eq!(asset(6).to_base_units(dec!(1.0000006)), Some(1_000_001));
    }

    #[test]
    fn test_to_base_units_rejects_negative() {
        assert_eq!(asset(6).to_base_units(dec!(-1)), None);
    }

    #[test]
    fn test_round_trip() {
        let a = asset(6);
        let base = a.to_base_units(dec!(1.5)).unwrap();
        assert_eq!(base, 1_500_000);
        assert_eq!(a.from_base_units(base), Some(dec!(1.5)));
    }

    #[test]
    fn test_from_base_units_uses_own_decimals() {
        assert_eq!(asset(9).from_base_units(1_500_000_000), Some(dec!(1.5)));
        assert_eq!(asset(2).from_base_units(150), Some(dec!(1.5)));
    }

    #[test]
    fn test_swap_job_timezone_defaults_to_utc() {
        let job: SwapJob = serde_json::from_value(serde_json::json!({
            "name": "test",
            "schedule": "0 0 * * * *",
            "input": "USDC",
            "output": "SOL",
            "amount": "25",
            "slippage_bps": 50
        }))
        .unwrap();
        assert_eq!(job.timezone, chrono_tz::UTC);
        assert_eq!(job.amount, dec!(25));
    }

    #[test]
    fn test_swap_job_timezone_parses_iana_name() {
        let job: SwapJob = serde_json::from_value(serde_json::json!({
            "name": "test",
            "schedule": "0 0 * * * *",
            "input": "USDC",
            "output": "SOL",
            "amount": "1",
            "slippage_bps": 50,
            "timezone": "Asia/Ho_Chi_Minh"
        }))
        .unwrap();
        assert_eq!(job.timezone.to_string(), "Asia/Ho_Chi_Minh");
    }
}
