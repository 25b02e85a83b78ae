//! Venue clients
//!
//! Turns validated orders into venue-native requests and submits them.

mod binance;
mod cex;
mod dex;
mod paper;

pub use binance::{BinanceConfig, BinanceRest};
pub use cex::{CexApi, CexVenue, OrderLeg, Side};
pub use dex::{DexPlacement, DexVenue};
pub use paper::PaperVenue;

use crate::chain::ChainError;
use crate::order::Order;
use crate::resolver::ResolveError;
use async_trait::async_trait;
use thiserror::Error;

/// Venue submission errors
#[derive(Debug, Error)]
pub enum VenueError {
    /// The order cannot be expressed on this venue
    #[error("order not supported by venue: {0}")]
    Unsupported(String),
    /// Transport-level failure; safe to retry
    #[error("network error: {0}")]
    Network(String),
    /// The venue actively refused the request. Never retried.
    #[error("venue rejected order: {0}")]
    Rejected(String),
    /// No liquidity pool exists for the pair
    #[error("no liquidity pool for {buy}/{sell}")]
    NoLiquidityPool { buy: String, sell: String },
    #[error(transparent)]
    AddressResolution(#[from] ResolveError),
}

impl VenueError {
    /// Whether a retry can possibly help
    pub fn is_transient(&self) -> bool {
        matches!(self, VenueError::Network(_))
    }
}

impl From<ChainError> for VenueError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::Rejected(message) => VenueError::Rejected(message),
            ChainError::Transport(message) => VenueError::Network(message),
            ChainError::Amount(message) | ChainError::InvalidAddress(message) => {
                VenueError::Unsupported(message)
            }
        }
    }
}

impl From<reqwest::Error> for VenueError {
    fn from(e: reqwest::Error) -> Self {
        VenueError::Network(e.to_string())
    }
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub enum Placement {
    /// One venue order id per submitted leg
    Cex { leg_ids: Vec<String> },
    /// An on-chain swap awaiting inclusion
    Dex(DexPlacement),
}

/// A trading destination that accepts orders
#[async_trait]
pub trait VenueClient: Send + Sync {
    fn name(&self) -> &str;

    /// Submit the order. Consumes one attempt; the caller decides whether a
    /// fresh order is warranted on failure.
    async fn place_order(&self, order: &Order) -> Result<Placement, VenueError>;
}
