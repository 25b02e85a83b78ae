//! CoinGecko address provider
//!
//! Two-step lookup: the coin list maps a symbol to a CoinGecko id, and the
//! coin detail endpoint lists per-platform contract addresses.

use super::{AddressProvider, AddressQuery, ResolveError};
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

const PROVIDER_NAME: &str = "coingecko";

/// Configuration for the CoinGecko client
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Our chain names mapped to CoinGecko platform keys
    pub platform_keys: HashMap<String, String>,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        let platform_keys = HashMap::from([
            (
                "binance_smart_chain".to_string(),
                "binance-smart-chain".to_string(),
            ),
            ("ethereum".to_string(), "ethereum".to_string()),
        ]);
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout: Duration::from_secs(10),
            platform_keys,
        }
    }
}

/// Client for CoinGecko's coins API
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CoinListEntry {
    id: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct CoinDetail {
    platforms: HashMap<String, Option<String>>,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ResolveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: format!("{status} - {body}"),
            });
        }

        response.json().await.map_err(|e| ResolveError::Provider {
            provider: PROVIDER_NAME,
            message: e.to_string(),
        })
    }

    /// Map a symbol to a CoinGecko coin id.
    async fn coin_id(&self, symbol: &str) -> Result<String, ResolveError> {
        let url = format!("{}/coins/list", self.config.base_url);
        let coins: Vec<CoinListEntry> = self.get_json(&url).await?;
        let symbol_lower = symbol.to_lowercase();
        coins
            .into_iter()
            .find(|c| c.symbol == symbol_lower)
            .map(|c| c.id)
            .ok_or_else(|| ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: format!("no coin id for symbol {symbol}"),
            })
    }
}

#[async_trait]
impl AddressProvider for CoinGeckoClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn contract_address(&self, query: &AddressQuery<'_>) -> Result<String, ResolveError> {
        let platform_key = self.config.platform_keys.get(query.chain).ok_or_else(|| {
            ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: format!("no platform key configured for chain {}", query.chain),
            }
        })?;

        let id = self.coin_id(query.symbol).await?;

        let url = format!("{}/coins/{}", self.config.base_url, id);
        tracing::debug!(url = %url, symbol = %query.symbol, "Querying CoinGecko coin detail");
        let detail: CoinDetail = self.get_json(&url).await?;

        let raw = detail
            .platforms
            .get(platform_key)
            .and_then(|a| a.clone())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: format!(
                    "coin {id} has no contract address on platform {platform_key}"
                ),
            })?;

        let address = Address::from_str(&raw).map_err(|_| ResolveError::InvalidAddress {
            provider: PROVIDER_NAME,
            address: raw.clone(),
        })?;
        Ok(address.to_checksum(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_platform_keys() {
        let config = CoinGeckoConfig::default();
        assert_eq!(
            config.platform_keys.get("binance_smart_chain").unwrap(),
            "binance-smart-chain"
        );
        assert_eq!(config.platform_keys.get("ethereum").unwrap(), "ethereum");
    }

    #[test]
    fn test_coin_detail_deserialize() {
        let json = r#"{
            "platforms": {
                "binance-smart-chain": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82",
                "energi": null
            }
        }"#;
        let detail: CoinDetail = serde_json::from_str(json).unwrap();
        assert!(detail
            .platforms
            .get("binance-smart-chain")
            .unwrap()
            .is_some());
        assert!(detail.platforms.get("energi").unwrap().is_none());
    }

    #[test]
    fn test_coin_list_deserialize() {
        let json = r#"[{"id": "pancakeswap-token", "symbol": "cake", "name": "PancakeSwap"}]"#;
        let coins: Vec<CoinListEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(coins[0].id, "pancakeswap-token");
        assert_eq!(coins[0].symbol, "cake");
    }
}
