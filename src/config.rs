//! Configuration types for listing-sniper

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub venues: VenuesConfig,
    pub trader: TraderConfig,
    pub detector: DetectorConfig,
    pub stream: StreamConfig,
    pub resolver: ResolverConfig,
    pub cex: CexConfig,
    pub chain: ChainConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub handler: HandlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub recon: ReconConfig,
}

/// Concrete venue lists behind the `cex` and `dex` aliases
#[derive(Debug, Clone, Deserialize)]
pub struct VenuesConfig {
    pub cexs: Vec<String>,
    pub dexs: Vec<String>,
}

/// What to trade when a listing is detected
#[derive(Debug, Clone, Deserialize)]
pub struct TraderConfig {
    /// Quote asset sold to acquire a newly listed symbol
    pub quote_symbol: String,
    /// Quantity of the quote asset committed per listing
    pub order_quantity: Decimal,
    /// Venue list stamped onto generated orders (aliases allowed)
    pub venues: Vec<String>,
}

/// Listing announcement detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Venue name expected in announcement text, e.g. "Binance"
    pub venue_name: String,
}

/// Social stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub base_url: String,
    pub bearer_token: String,
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: u32,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_max_reconnects() -> u32 {
    10
}
fn default_reconnect_delay_secs() -> u64 {
    5
}

/// Symbol-to-address resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Chain the resolved addresses live on, e.g. "binance_smart_chain"
    pub chain: String,
    /// Network within the chain: "mainnet" or "testnet"
    pub network: String,
    /// JSON file caching resolved addresses
    pub cache_path: PathBuf,
    pub coinmarketcap_url: String,
    pub coinmarketcap_api_key: String,
    pub coingecko_url: String,
}

/// CEX REST configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CexConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

fn default_recv_window_ms() -> u64 {
    5000
}

/// Chain and AMM router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub router_address: String,
    pub factory_address: String,
    /// Hex-encoded private key of the trading account
    pub private_key: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Multiplier applied to the node-reported gas price, e.g. 1.4
    #[serde(default = "default_gas_price_multiplier")]
    pub gas_price_multiplier: Decimal,
    /// Slippage tolerance in decimal form, e.g. 0.02 for 2%
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,
    /// Swap deadline window in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

fn default_gas_limit() -> u64 {
    250_000
}
fn default_gas_price_multiplier() -> Decimal {
    Decimal::new(14, 1) // 1.4
}
fn default_slippage() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_deadline_secs() -> u64 {
    300
}

/// Order dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// How long to wait for on-chain inclusion before resubmitting
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Receipt poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total attempts allowed per order, counting the first submission
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Inbound order queue depth
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_confirmation_timeout_secs() -> u64 {
    90
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_attempts() -> u32 {
    3
}
fn default_queue_depth() -> usize {
    64
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 90,
            poll_interval_ms: 500,
            max_attempts: 3,
            queue_depth: 64,
        }
    }
}

/// Bounded retry configuration for outbound calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_attempts() -> u32 {
    5
}
fn default_base_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 250,
            max_delay_ms: 2000,
        }
    }
}

/// Post-listing market data sampling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between price samples
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,

    /// Total sampling window per listing, in seconds
    #[serde(default = "default_sample_window_secs")]
    pub sample_window_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/recon")
}
fn default_sample_interval_secs() -> u64 {
    15
}
fn default_sample_window_secs() -> u64 {
    4 * 60 * 60
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sample_interval_secs: 15,
            sample_window_secs: 4 * 60 * 60,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub metrics_port: u16,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
