//! Binance-style REST client
//!
//! Signed endpoints take an HMAC-SHA256 signature over the query string,
//! hex-encoded, with the API key in the `X-MBX-APIKEY` header.

use super::cex::{CexApi, OrderLeg};
use super::VenueError;
use crate::order::OrderType;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Configuration for the Binance REST client
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
    pub recv_window_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout: Duration::from_secs(10),
            recv_window_ms: 5000,
        }
    }
}

impl BinanceConfig {
    pub fn from_config(config: &crate::config::CexConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            recv_window_ms: config.recv_window_ms,
            ..Self::default()
        }
    }
}

/// REST client for a Binance-compatible spot API
pub struct BinanceRest {
    config: BinanceConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

impl BinanceRest {
    pub fn new(config: BinanceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    /// Hex-encoded HMAC-SHA256 of the query string.
    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 4xx responses are venue rejections, everything else transient.
    fn classify_failure(status: StatusCode, body: &str) -> VenueError {
        if status.is_client_error() {
            let message = serde_json::from_str::<ApiError>(body)
                .map(|e| format!("{} (code {})", e.msg, e.code))
                .unwrap_or_else(|_| body.to_string());
            VenueError::Rejected(message)
        } else {
            VenueError::Network(format!("{status} - {body}"))
        }
    }
}

#[async_trait::async_trait]
impl CexApi for BinanceRest {
    async fn ticker_price(&self, base: &str, quote: &str) -> Result<Decimal, VenueError> {
        let url = format!("{}/api/v3/ticker/price", self.config.base_url);
        let symbol = format!("{base}{quote}");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let ticker: TickerResponse = response.json().await?;
        Decimal::from_str(&ticker.price)
            .map_err(|e| VenueError::Network(format!("unparseable ticker price: {e}")))
    }

    async fn submit_leg(&self, leg: &OrderLeg) -> Result<String, VenueError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut params = vec![
            ("symbol".to_string(), leg.symbol()),
            ("side".to_string(), leg.side.to_string()),
            (
                "type".to_string(),
                match leg.order_type {
                    OrderType::Market => "MARKET".to_string(),
                    OrderType::Limit => "LIMIT".to_string(),
                },
            ),
            ("quantity".to_string(), leg.quantity.to_string()),
        ];
        if leg.order_type == OrderType::Limit {
            let price = leg.price.ok_or_else(|| {
                VenueError::Unsupported("limit leg without a price".to_string())
            })?;
            params.push(("price".to_string(), price.to_string()));
            params.push(("timeInForce".to_string(), "GTC".to_string()));
        }
        params.push((
            "recvWindow".to_string(),
            self.config.recv_window_ms.to_string(),
        ));
        params.push(("timestamp".to_string(), timestamp.to_string()));

        let query: String = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let signature = self.sign(&query);
        let url = format!(
            "{}/api/v3/order?{}&signature={}",
            self.config.base_url, query, signature
        );

        tracing::debug!(symbol = %leg.symbol(), side = %leg.side, "Submitting order leg");

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let placed: OrderResponse = response.json().await?;
        Ok(placed.order_id.to_string())
    }
}
