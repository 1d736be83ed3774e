// Aggregator port: route computation and execution
//
// The swap executor only ever sees the trait, so the whole retry/scheduling
// path is testable against fakes. The production implementation speaks a
// Jupiter-style HTTP quote/execute API.

use crate::config::AggregatorConfig;
use crate::errors::AggregatorError;
use crate::models::{ExecutionResult, Route, RouteRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Routing/execution capability consumed by the swap executor
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Compute a best-execution route; None when no path exists
    async fn compute_route(&self, request: &RouteRequest)
        -> Result<Option<Route>, AggregatorError>;

    /// Submit a previously computed route for execution
    async fn execute(&self, route: &Route) -> Result<ExecutionResult, AggregatorError>;
}

/// Quote response subset we interpret; the full payload stays opaque
#[derive(Debug, Deserialize)]
struct QuoteReply {
    #[serde(rename = "outAmount")]
    out_amount: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteReply {
    error: Option<String>,
    txid: Option<String>,
    #[serde(rename = "inputAmount")]
    input_amount: Option<String>,
    #[serde(rename = "outputAmount")]
    output_amount: Option<String>,
}

/// HTTP implementation of the aggregator port
pub struct HttpAggregator {
    client: reqwest::Client,
    config: AggregatorConfig,
}

impl HttpAggregator {
    /// Create a new HttpAggregator with a bounded request timeout
    pub fn new(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AggregatorError::RequestFailed(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Create a new HttpAggregator with a caller-provided client
    pub fn with_client(client: reqwest::Client, config: AggregatorConfig) -> Self {
        Self { client, config }
    }

    fn parse_base_units(field: &str, value: &str) -> Result<u128, AggregatorError> {
        value
            .parse::<u128>()
            .map_err(|e| AggregatorError::MalformedResponse(format!("{field}: {e}")))
    }
}

#[async_trait]
impl Aggregator for HttpAggregator {
    async fn compute_route(
        &self,
        request: &RouteRequest,
    ) -> Result<Option<Route>, AggregatorError> {
        let mut query: Vec<(&str, String)> = vec![
            ("inputMint", request.input_address.clone()),
            ("outputMint", request.output_address.clone()),
            ("amount", request.amount.to_string()),
            ("slippageBps", request.slippage_bps.to_string()),
            (
                "onlyDirectRoutes",
                self.config.only_direct_routes.to_string(),
            ),
            (
                "restrictIntermediateTokens",
                self.config.restrict_intermediate_assets.to_string(),
            ),
        ];
        if !self.config.excluded_venues.is_empty() {
            query.push(("excludeDexes", self.config.excluded_venues.join(",")));
        }

        debug!(
            input = %request.input_address,
            output = %request.output_address,
            amount = request.amount,
            "Requesting route"
        );

        let response = self
            .client
            .get(&self.config.quote_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();

        // The quote endpoint signals "no route" with a client error
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AggregatorError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AggregatorError::MalformedResponse(e.to_string()))?;

        let quote: QuoteReply = serde_json::from_value(payload.clone())
            .map_err(|e| AggregatorError::MalformedResponse(e.to_string()))?;
        let quoted_out = Self::parse_base_units("outAmount", &quote.out_amount)?;

        Ok(Some(Route {
            quoted_out,
            payload,
        }))
    }

    async fn execute(&self, route: &Route) -> Result<ExecutionResult, AggregatorError> {
        let response = self
            .client
            .post(&self.config.execute_url)
            .json(&serde_json::json!({ "quoteResponse": route.payload }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AggregatorError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ExecuteReply = response
            .json()
            .await
            .map_err(|e| AggregatorError::MalformedResponse(e.to_string()))?;

        if let Some(error) = reply.error {
            return Ok(ExecutionResult::Failed { error });
        }

        match (reply.txid, reply.input_amount, reply.output_amount) {
            (Some(txid), Some(input_amount), Some(output_amount)) => {
                Ok(ExecutionResult::Confirmed {
                    input_amount: Self::parse_base_units("inputAmount", &input_amount)?,
                    output_amount: Self::parse_base_units("outputAmount", &output_amount)?,
                    tx_ref: txid,
                })
            }
            _ => Err(AggregatorError::MalformedResponse(
                "Execution reply missing txid or amounts".to_string(),
            )),
        }
    }
}
