//! Order construction and validation
//!
//! An [`Order`] is immutable once built. Resubmission produces a new value
//! with `attempt_count + 1` rather than mutating in place.

use crate::config::VenuesConfig;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order (immediate execution at prevailing price)
    Market,
    /// Limit order (price specified)
    Limit,
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(OrderError::UnknownOrderType(other.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// Asset class the order trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Spot,
    Future,
    Perp,
}

impl FromStr for AssetClass {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spot" => Ok(AssetClass::Spot),
            "future" => Ok(AssetClass::Future),
            "perp" => Ok(AssetClass::Perp),
            other => Err(OrderError::UnknownAssetClass(other.to_string())),
        }
    }
}

/// Order construction errors, one per violated invariant
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("unrecognised order type: {0}")]
    UnknownOrderType(String),
    #[error("unrecognised asset class: {0}")]
    UnknownAssetClass(String),
    #[error("buy and sell symbols must be non-empty")]
    EmptySymbol,
    #[error("buy and sell symbols must differ, both are {0}")]
    SameSymbol(String),
    #[error("quantities must be non-negative, got buy={buy} sell={sell}")]
    NegativeQuantity { buy: Decimal, sell: Decimal },
    #[error("exactly one of quantity_to_buy and quantity_to_sell must be non-zero, got buy={buy} sell={sell}")]
    QuantityExclusivity { buy: Decimal, sell: Decimal },
    #[error("a limit order requires a non-zero price_in_sell")]
    MissingLimitPrice,
    #[error("an order needs at least one venue")]
    NoVenues,
}

/// Unvalidated order inputs, turned into an [`Order`] by [`OrderRequest::build`]
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub buy_symbol: String,
    pub sell_symbol: String,
    pub order_type: OrderType,
    pub asset_class: AssetClass,
    pub quantity_to_buy: Decimal,
    pub quantity_to_sell: Decimal,
    /// Limit price, quoted in sell-asset units per buy-asset unit
    pub price_in_sell: Option<Decimal>,
    /// Venue identifiers; the aliases `cex` and `dex` expand to configured lists
    pub venues: Vec<String>,
    /// Venue-specific hints, e.g. `buy_token_name` for address lookup
    pub notes: HashMap<String, String>,
}

impl OrderRequest {
    /// Validate the request and produce an immutable order.
    ///
    /// Purely a validating constructor: no network or file I/O happens here.
    /// Venue aliases are expanded eagerly against the configured lists.
    pub fn build(self, venues: &VenuesConfig) -> Result<Order, OrderError> {
        if self.buy_symbol.trim().is_empty() || self.sell_symbol.trim().is_empty() {
            return Err(OrderError::EmptySymbol);
        }
        let buy_symbol = self.buy_symbol.trim().to_uppercase();
        let sell_symbol = self.sell_symbol.trim().to_uppercase();
        if buy_symbol == sell_symbol {
            return Err(OrderError::SameSymbol(buy_symbol));
        }

        if self.quantity_to_buy.is_sign_negative() || self.quantity_to_sell.is_sign_negative() {
            return Err(OrderError::NegativeQuantity {
                buy: self.quantity_to_buy,
                sell: self.quantity_to_sell,
            });
        }
        if self.quantity_to_buy.is_zero() == self.quantity_to_sell.is_zero() {
            return Err(OrderError::QuantityExclusivity {
                buy: self.quantity_to_buy,
                sell: self.quantity_to_sell,
            });
        }

        if self.order_type == OrderType::Limit
            && self.price_in_sell.unwrap_or(Decimal::ZERO).is_zero()
        {
            return Err(OrderError::MissingLimitPrice);
        }

        let expanded = expand_venues(&self.venues, venues);
        if expanded.is_empty() {
            return Err(OrderError::NoVenues);
        }

        Ok(Order {
            id: Uuid::new_v4(),
            buy_symbol,
            sell_symbol,
            order_type: self.order_type,
            asset_class: self.asset_class,
            quantity_to_buy: self.quantity_to_buy,
            quantity_to_sell: self.quantity_to_sell,
            price_in_sell: self.price_in_sell,
            venues: expanded,
            notes: self.notes,
            attempt_count: 0,
            created_at: Utc::now(),
        })
    }
}

/// A validated, immutable trade instruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Stable identifier shared across resubmission attempts
    pub id: Uuid,
    /// Upper-cased symbol of the asset to buy
    pub buy_symbol: String,
    /// Upper-cased symbol of the asset to sell
    pub sell_symbol: String,
    pub order_type: OrderType,
    pub asset_class: AssetClass,
    pub quantity_to_buy: Decimal,
    pub quantity_to_sell: Decimal,
    /// Limit price in sell-asset units per buy-asset unit; ignored downstream
    /// for market orders
    pub price_in_sell: Option<Decimal>,
    /// Concrete venue identifiers after alias expansion
    pub venues: Vec<String>,
    pub notes: HashMap<String, String>,
    /// Zero on first submission
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A fresh order for the next attempt. The original value is untouched.
    pub fn resubmit(&self) -> Order {
        let mut next = self.clone();
        next.attempt_count = self.attempt_count + 1;
        next.created_at = Utc::now();
        next
    }

    pub fn is_limit(&self) -> bool {
        self.order_type == OrderType::Limit
    }
}

/// Expand `cex`/`dex` aliases to the configured venue lists.
///
/// Lower-cases identifiers and removes duplicates while preserving order, so
/// expansion is idempotent.
pub fn expand_venues(requested: &[String], config: &VenuesConfig) -> Vec<String> {
    let mut expanded = Vec::new();
    for venue in requested {
        match venue.to_lowercase().as_str() {
            "cex" => expanded.extend(config.cexs.iter().map(|v| v.to_lowercase())),
            "dex" => expanded.extend(config.dexs.iter().map(|v| v.to_lowercase())),
            concrete => expanded.push(concrete.to_string()),
        }
    }
    let mut seen = std::collections::HashSet::new();
    expanded.retain(|v| seen.insert(v.clone()));
    expanded
}
