// Asset registry: one-shot token-list snapshot fetch and symbol resolution
//
// The registry is populated once at process start and never mutated. A
// configured symbol resolves iff its address appears in the fetched snapshot;
// decimals and the display symbol come from the snapshot.

use crate::config::RegistryConfig;
use crate::errors::RegistryError;
use crate::models::Asset;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// One entry of the token-list snapshot
#[derive(Debug, Clone, Deserialize)]
struct TokenEntry {
    address: String,
    symbol: String,
    decimals: u32,
}

/// Immutable symbol -> Asset mapping
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: HashMap<String, Asset>,
}

impl AssetRegistry {
    /// Fetch the token-list snapshot and resolve the configured universe
    /// against it. Failure here is fatal to the process.
    #[tracing::instrument(skip(client, config))]
    pub async fn fetch(
        client: &reqwest::Client,
        config: &RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let response = client.get(&config.token_list_url).send().await?;

        if !response.status().is_success() {
            return Err(RegistryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let entries: Vec<TokenEntry> = response
            .json()
            .await
            .map_err(|e| RegistryError::MalformedSnapshot(e.to_string()))?;

        info!(token_count = entries.len(), "Token list snapshot fetched");

        let by_address: HashMap<&str, &TokenEntry> = entries
            .iter()
            .map(|entry| (entry.address.as_str(), entry))
            .collect();

        let mut assets = HashMap::new();
        for (symbol, address) in &config.assets {
            match by_address.get(address.as_str()) {
                Some(entry) => {
                    assets.insert(
                        symbol.clone(),
                        Asset {
                            address: entry.address.clone(),
                            symbol: entry.symbol.clone(),
                            decimals: entry.decimals,
                        },
                    );
                }
                None => {
                    warn!(
                        symbol = %symbol,
                        address = %address,
                        "Configured asset not present in token list; it will not resolve"
                    );
                }
            }
        }

        info!(
            resolved = assets.len(),
            configured = config.assets.len(),
            "Asset registry built"
        );

        Ok(Self { assets })
    }

    /// Build directly from assets, keyed by their symbol; used by tests
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets
                .into_iter()
                .map(|asset| (asset.symbol.clone(), asset))
                .collect(),
        }
    }

    pub fn resolve(&self, symbol: &str) -> Option<&Asset> {
        self.assets.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.assets.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(symbol: &str, decimals: u32) -> Asset {
        Asset {
            address: format!("{symbol}-address"),
            symbol: symbol.to_string(),
            decimals,
        }
    }

    #[test]
    fn test_from_assets_resolves_by_symbol() {
        let registry = AssetRegistry::from_assets([asset("SOL", 9), asset("USDC", 6)]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("SOL").unwrap().decimals, 9);
        assert_eq!(registry.resolve("USDC").unwrap().decimals, 6);
        assert!(registry.resolve("NONEXISTENT").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = AssetRegistry::default();
        assert!(registry.is_empty());
        assert!(!registry.contains("SOL"));
    }
}
