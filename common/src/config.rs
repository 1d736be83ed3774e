// Configuration management with layered configuration (file, env)

use crate::models::SwapJob;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure containing all configuration options. Built once
/// at startup and passed by reference into the components; nothing reads
/// ambient state afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub aggregator: AggregatorConfig,
    pub registry: RegistryConfig,
    pub trading: TradingConfig,
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub jobs: Vec<SwapJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub quote_url: String,
    pub execute_url: String,
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub only_direct_routes: bool,
    #[serde(default = "default_restrict_intermediate_assets")]
    pub restrict_intermediate_assets: bool,
    #[serde(default)]
    pub excluded_venues: Vec<String>,
}

fn default_restrict_intermediate_assets() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub token_list_url: String,
    /// Tradable universe: job symbol -> chain address
    #[serde(default)]
    pub assets: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Administrative switch; when false the executor never reaches the
    /// aggregator
    pub enabled: bool,
    /// Total attempts per invocation, including the first (>= 1)
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Prometheus listener port; no listener when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults file → local
    /// overrides → environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.aggregator.quote_url.is_empty() {
            return Err("Aggregator quote_url cannot be empty".to_string());
        }
        if self.aggregator.execute_url.is_empty() {
            return Err("Aggregator execute_url cannot be empty".to_string());
        }
        if self.aggregator.request_timeout_seconds == 0 {
            return Err("Aggregator request_timeout_seconds must be greater than 0".to_string());
        }

        if self.registry.token_list_url.is_empty() {
            return Err("Registry token_list_url cannot be empty".to_string());
        }

        if self.trading.max_attempts == 0 {
            return Err("Trading max_attempts must be at least 1".to_string());
        }

        for job in &self.jobs {
            if job.name.is_empty() {
                return Err("Job name cannot be empty".to_string());
            }
            if job.amount.is_sign_negative() || job.amount.is_zero() {
                return Err(format!("Job '{}' amount must be positive", job.name));
            }
            if job.slippage_bps > 10_000 {
                return Err(format!(
                    "Job '{}' slippage_bps must not exceed 10000",
                    job.name
                ));
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aggregator: AggregatorConfig {
                quote_url: "https://quote-api.jup.ag/v6/quote".to_string(),
                execute_url: "http://127.0.0.1:8787/execute".to_string(),
                request_timeout_seconds: 30,
                only_direct_routes: false,
                restrict_intermediate_assets: true,
                excluded_venues: Vec::new(),
            },
            registry: RegistryConfig {
                token_list_url: "https://cache.jup.ag/tokens".to_string(),
                assets: HashMap::new(),
            },
            trading: TradingConfig {
                enabled: false,
                max_attempts: 3,
                retry_delay_seconds: 5,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: None,
            },
            jobs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn job(name: &str, amount: rust_decimal::Decimal, slippage_bps: u16) -> SwapJob {
        SwapJob {
            name: name.to_string(),
            schedule: "0 0 * * * *".to_string(),
            input: "USDC".to_string(),
            output: "SOL".to_string(),
            amount,
            slippage_bps,
            timezone: chrono_tz::UTC,
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_quote_url() {
        let mut settings = Settings::default();
        settings.aggregator.quote_url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_max_attempts() {
        let mut settings = Settings::default();
        settings.trading.max_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_non_positive_amount() {
        let mut settings = Settings::default();
        settings.jobs.push(job("zero", dec!(0), 50));
        assert!(settings.validate().is_err());

        settings.jobs[0] = job("negative", dec!(-1), 50);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_excessive_slippage() {
        let mut settings = Settings::default();
        settings.jobs.push(job("wide", dec!(1), 10_001));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_reasonable_job() {
        let mut settings = Settings::default();
        settings.jobs.push(job("dca", dec!(25), 50));
        assert!(settings.validate().is_ok());
    }
}
