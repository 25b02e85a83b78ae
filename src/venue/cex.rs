//! CEX venue client
//!
//! Most symbols are only tradable through an intermediate quote asset, so an
//! order decomposes into one or two concrete legs. For a two-hop limit order
//! the limit-price deviation from the market cross price is split equally
//! between the legs.

use super::{Placement, VenueClient, VenueError};
use crate::order::{AssetClass, Order, OrderType};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;

/// Leg direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One venue-native order request
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLeg {
    pub base: String,
    pub quote: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Quantity in base-asset units
    pub quantity: Decimal,
    /// Price in quote-asset units per base unit; `None` for market legs
    pub price: Option<Decimal>,
}

impl OrderLeg {
    /// Venue symbol in concatenated form, e.g. `FOOUSDT`
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

/// The REST surface the venue client needs
#[async_trait]
pub trait CexApi: Send + Sync {
    /// Last traded price of `base` quoted in `quote` units.
    async fn ticker_price(&self, base: &str, quote: &str) -> Result<Decimal, VenueError>;

    /// Submit one leg, returning the venue's order id.
    async fn submit_leg(&self, leg: &OrderLeg) -> Result<String, VenueError>;
}

/// Centralized exchange venue client
pub struct CexVenue<A: CexApi> {
    name: String,
    api: A,
    /// Intermediate quote asset used for multi-hop routing
    quote: String,
    retry: RetryPolicy,
}

impl<A: CexApi> CexVenue<A> {
    pub fn new(name: impl Into<String>, api: A, quote: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            api,
            quote: quote.into().to_uppercase(),
            retry,
        }
    }

    /// Decompose an order into venue-native legs.
    pub async fn plan_legs(&self, order: &Order) -> Result<Vec<OrderLeg>, VenueError> {
        let buy = order.buy_symbol.as_str();
        let sell = order.sell_symbol.as_str();
        let quote = self.quote.as_str();
        let limit_price = order.price_in_sell.filter(|_| order.is_limit());

        // Venues size orders in base-asset units, so a sell-denominated order
        // converts through the limit price or the market cross price.
        let mut cross: Option<Decimal> = None;
        let quantity_to_buy = if order.quantity_to_buy.is_zero() {
            match limit_price {
                Some(price) => order.quantity_to_sell / price,
                None => {
                    let market = self.cross_price(buy, sell).await?;
                    cross = Some(market);
                    order.quantity_to_sell / market
                }
            }
        } else {
            order.quantity_to_buy
        };

        if sell == quote {
            // Single leg: buy the asset directly with the quote
            return Ok(vec![OrderLeg {
                base: buy.to_string(),
                quote: quote.to_string(),
                side: Side::Buy,
                order_type: order.order_type,
                quantity: quantity_to_buy,
                price: limit_price,
            }]);
        }

        if buy == quote {
            // Single leg: sell the asset for the quote. The venue prices the
            // pair in quote units per base unit, the inverse of price_in_sell.
            let quantity = if order.quantity_to_sell.is_zero() {
                match limit_price {
                    Some(price) => order.quantity_to_buy * price,
                    None => {
                        let market = match cross {
                            Some(c) => c,
                            None => self.cross_price(buy, sell).await?,
                        };
                        order.quantity_to_buy * market
                    }
                }
            } else {
                order.quantity_to_sell
            };
            return Ok(vec![OrderLeg {
                base: sell.to_string(),
                quote: quote.to_string(),
                side: Side::Sell,
                order_type: order.order_type,
                quantity,
                price: limit_price.map(|p| Decimal::ONE / p),
            }]);
        }

        // Two hops through the quote asset
        let sell_in_quote = self.api.ticker_price(sell, quote).await?;
        let buy_in_quote = self.api.ticker_price(buy, quote).await?;

        let (leg1_price, leg2_price) = match limit_price {
            None => (None, None),
            Some(price) => {
                // Deviation between the market cross price and the limit,
                // expressed in quote units and split equally across the legs:
                // sell higher on the first hop, buy cheaper on the second.
                let market_cross = buy_in_quote / sell_in_quote;
                let deviation_in_quote = (market_cross - price) * sell_in_quote;
                let half = deviation_in_quote / Decimal::TWO;
                (Some(sell_in_quote + half), Some(buy_in_quote - half))
            }
        };

        let leg1_quantity = if order.quantity_to_sell.is_zero() {
            match limit_price {
                Some(price) => quantity_to_buy * price,
                None => quantity_to_buy * (buy_in_quote / sell_in_quote),
            }
        } else {
            order.quantity_to_sell
        };

        Ok(vec![
            OrderLeg {
                base: sell.to_string(),
                quote: quote.to_string(),
                side: Side::Sell,
                order_type: order.order_type,
                quantity: leg1_quantity,
                price: leg1_price,
            },
            OrderLeg {
                base: buy.to_string(),
                quote: quote.to_string(),
                side: Side::Buy,
                order_type: order.order_type,
                quantity: quantity_to_buy,
                price: leg2_price,
            },
        ])
    }

    /// Market price of `buy` in `sell` units, routed through the quote asset
    /// when neither side is the quote.
    async fn cross_price(&self, buy: &str, sell: &str) -> Result<Decimal, VenueError> {
        let quote = self.quote.as_str();
        if sell == quote {
            self.api.ticker_price(buy, quote).await
        } else if buy == quote {
            let sell_in_quote = self.api.ticker_price(sell, quote).await?;
            Ok(Decimal::ONE / sell_in_quote)
        } else {
            let buy_in_quote = self.api.ticker_price(buy, quote).await?;
            let sell_in_quote = self.api.ticker_price(sell, quote).await?;
            Ok(buy_in_quote / sell_in_quote)
        }
    }
}

#[async_trait]
impl<A: CexApi> VenueClient for CexVenue<A> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn place_order(&self, order: &Order) -> Result<Placement, VenueError> {
        if order.asset_class != AssetClass::Spot {
            return Err(VenueError::Unsupported(format!(
                "only spot orders are routed to {}, got {:?}",
                self.name, order.asset_class
            )));
        }

        tracing::info!(order_id = %order.id, venue = %self.name, "Placing CEX order");
        let legs = self.plan_legs(order).await?;
        tracing::debug!(order_id = %order.id, legs = legs.len(), "Planned order path");

        let mut leg_ids = Vec::with_capacity(legs.len());
        for leg in &legs {
            let leg_id = self
                .retry
                .run(|| self.api.submit_leg(leg), VenueError::is_transient)
                .await?;
            tracing::info!(
                order_id = %order.id,
                symbol = %leg.symbol(),
                side = %leg.side,
                quantity = %leg.quantity,
                leg_id = %leg_id,
                "Leg placed"
            );
            leg_ids.push(leg_id);
        }

        Ok(Placement::Cex { leg_ids })
    }
}
