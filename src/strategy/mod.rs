//! Listing strategy
//!
//! Turns detected listing announcements into orders: market-buy the newly
//! listed symbol with a fixed quantity of the configured quote asset.

use crate::config::{TraderConfig, VenuesConfig};
use crate::detector::ListingDetector;
use crate::order::{AssetClass, Order, OrderError, OrderRequest, OrderType};
use crate::stream::StreamMessage;
use crate::telemetry;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Produces orders from stream messages
pub struct StrategyDriver {
    detector: ListingDetector,
    venues: VenuesConfig,
    trader: TraderConfig,
}

impl StrategyDriver {
    pub fn new(detector: ListingDetector, venues: VenuesConfig, trader: TraderConfig) -> Self {
        Self {
            detector,
            venues,
            trader,
        }
    }

    /// Build the order a message calls for, if any.
    pub fn order_for(&self, message: &StreamMessage) -> Option<Result<Order, OrderError>> {
        let listing = self.detector.detect(&message.text)?;
        let notes = HashMap::from([
            ("buy_token_name".to_string(), listing.token_name.clone()),
            ("announcement_id".to_string(), message.id.clone()),
        ]);
        Some(
            OrderRequest {
                buy_symbol: listing.symbol,
                sell_symbol: self.trader.quote_symbol.clone(),
                order_type: OrderType::Market,
                asset_class: AssetClass::Spot,
                quantity_to_buy: Decimal::ZERO,
                quantity_to_sell: self.trader.order_quantity,
                price_in_sell: None,
                venues: self.trader.venues.clone(),
                notes,
            }
            .build(&self.venues),
        )
    }

    /// Consume stream messages until the channel closes, pushing orders
    /// onto the order queue.
    pub async fn run(
        self,
        mut message_rx: mpsc::Receiver<StreamMessage>,
        order_tx: mpsc::Sender<Order>,
    ) -> anyhow::Result<()> {
        while let Some(message) = message_rx.recv().await {
            match self.order_for(&message) {
                None => {
                    tracing::debug!(message_id = %message.id, "No listing announcement in message");
                }
                Some(Ok(order)) => {
                    telemetry::record_listing_detected();
                    tracing::info!(
                        symbol = %order.buy_symbol,
                        order_id = %order.id,
                        "New listing detected, order queued"
                    );
                    if order_tx.send(order).await.is_err() {
                        tracing::info!("Order queue closed, strategy stopping");
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(message_id = %message.id, error = %e, "Detected listing produced an invalid order");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn driver() -> StrategyDriver {
        StrategyDriver::new(
            ListingDetector::new("Binance"),
            VenuesConfig {
                cexs: vec!["binance".to_string()],
                dexs: vec!["pancakeswapv2".to_string()],
            },
            TraderConfig {
                quote_symbol: "USDT".to_string(),
                order_quantity: dec!(25),
                venues: vec!["cex".to_string(), "dex".to_string()],
            },
        )
    }

    fn message(text: &str) -> StreamMessage {
        StreamMessage {
            id: "42".to_string(),
            author_id: "binance".to_string(),
            text: text.to_string(),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_listing_produces_market_order() {
        let order = driver()
            .order_for(&message("Binance will list Foo Protocol (FOO)"))
            .unwrap()
            .unwrap();

        assert_eq!(order.buy_symbol, "FOO");
        assert_eq!(order.sell_symbol, "USDT");
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.quantity_to_sell, dec!(25));
        assert_eq!(order.quantity_to_buy, Decimal::ZERO);
        assert_eq!(
            order.venues,
            vec!["binance".to_string(), "pancakeswapv2".to_string()]
        );
        assert_eq!(
            order.notes.get("buy_token_name").map(String::as_str),
            Some("Foo Protocol")
        );
    }

    #[test]
    fn test_unrelated_message_produces_nothing() {
        assert!(driver().order_for(&message("gm")).is_none());
    }

    #[tokio::test]
    async fn test_run_pushes_orders_onto_queue() {
        let (message_tx, message_rx) = mpsc::channel(8);
        let (order_tx, mut order_rx) = mpsc::channel(8);

        let task = tokio::spawn(driver().run(message_rx, order_tx));

        message_tx.send(message("gm")).await.unwrap();
        message_tx
            .send(message("Binance will list Foo (FOO)"))
            .await
            .unwrap();
        drop(message_tx);

        let order = order_rx.recv().await.unwrap();
        assert_eq!(order.buy_symbol, "FOO");
        assert!(order_rx.recv().await.is_none());
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_order_queue_closes() {
        let (message_tx, message_rx) = mpsc::channel(8);
        let (order_tx, order_rx) = mpsc::channel(8);
        drop(order_rx);

        let task = tokio::spawn(driver().run(message_rx, order_tx));
        message_tx
            .send(message("Binance will list Foo (FOO)"))
            .await
            .unwrap();

        task.await.unwrap().unwrap();
    }
}
