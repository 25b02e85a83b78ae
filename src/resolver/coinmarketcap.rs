//! CoinMarketCap address provider
//!
//! Uses the `/v1/cryptocurrency/map` endpoint. A symbol can map to several
//! tokens, so the optional token name narrows the match before falling back
//! to the first entry.

use super::{name_formats, AddressProvider, AddressQuery, ResolveError};
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

const PROVIDER_NAME: &str = "coinmarketcap";

/// Configuration for the CoinMarketCap client
#[derive(Debug, Clone)]
pub struct CoinMarketCapConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for CoinMarketCapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pro-api.coinmarketcap.com".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for CoinMarketCap's cryptocurrency map API
pub struct CoinMarketCapClient {
    config: CoinMarketCapConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    data: Vec<MapEntry>,
}

#[derive(Debug, Deserialize)]
struct MapEntry {
    symbol: String,
    name: String,
    slug: String,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct Platform {
    token_address: String,
}

impl CoinMarketCapClient {
    pub fn new(config: CoinMarketCapConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    /// Pick one address out of a multi-token symbol collision.
    fn select_address(
        entries: &[MapEntry],
        symbol: &str,
        token_name: Option<&str>,
    ) -> Option<String> {
        let matching: Vec<&MapEntry> = entries
            .iter()
            .filter(|e| e.symbol == symbol && e.platform.is_some())
            .collect();

        let selected = if matching.len() == 1 {
            Some(matching[0])
        } else {
            let named = token_name.and_then(|name| {
                let formats = name_formats(name);
                let named: Vec<&&MapEntry> = matching
                    .iter()
                    .filter(|e| formats.contains(&e.name) || formats.contains(&e.slug))
                    .collect();
                (named.len() == 1).then(|| *named[0])
            });
            // Nothing narrowed it down; take the first listed entry
            named.or_else(|| matching.first().copied())
        };

        selected
            .and_then(|e| e.platform.as_ref())
            .map(|p| p.token_address.clone())
    }
}

#[async_trait]
impl AddressProvider for CoinMarketCapClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn contract_address(&self, query: &AddressQuery<'_>) -> Result<String, ResolveError> {
        let url = format!("{}/v1/cryptocurrency/map", self.config.base_url);

        tracing::debug!(url = %url, symbol = %query.symbol, "Querying CoinMarketCap map");

        let response = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.config.api_key)
            .query(&[("symbol", query.symbol)])
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

        let map: MapResponse = response.json().await.map_err(|e| ResolveError::Provider {
            provider: PROVIDER_NAME,
            message: e.to_string(),
        })?;

        let raw = Self::select_address(&map.data, query.symbol, query.token_name).ok_or_else(
            || ResolveError::Provider {
                provider: PROVIDER_NAME,
                message: format!("no token entry for symbol {}", query.symbol),
            },
        )?;

        let address = Address::from_str(&raw).map_err(|_| ResolveError::InvalidAddress {
            provider: PROVIDER_NAME,
            address: raw.clone(),
        })?;
        Ok(address.to_checksum(None))
    }
}
