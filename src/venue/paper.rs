//! Paper venue
//!
//! Accepts every order and records it instead of submitting anywhere. Used
//! for dry runs of the live pipeline.

use super::{Placement, VenueClient, VenueError};
use crate::order::Order;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Records orders in memory with simulated placements
pub struct PaperVenue {
    name: String,
    orders: Arc<RwLock<Vec<Order>>>,
}

impl PaperVenue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orders: Arc::new(RwLock::new(vec![])),
        }
    }

    /// All orders accepted so far
    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl VenueClient for PaperVenue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn place_order(&self, order: &Order) -> Result<Placement, VenueError> {
        let mut orders = self.orders.write().await;
        orders.push(order.clone());

        tracing::info!(
            order_id = %order.id,
            venue = %self.name,
            buy = %order.buy_symbol,
            sell = %order.sell_symbol,
            "Paper order accepted"
        );
        Ok(Placement::Cex {
            leg_ids: vec![format!("paper-{}", orders.len())],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenuesConfig;
    use crate::order::{AssetClass, OrderRequest, OrderType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn order() -> Order {
        OrderRequest {
            buy_symbol: "FOO".to_string(),
            sell_symbol: "USDT".to_string(),
            order_type: OrderType::Market,
            asset_class: AssetClass::Spot,
            quantity_to_buy: Decimal::ZERO,
            quantity_to_sell: dec!(25),
            price_in_sell: None,
            venues: vec!["binance".to_string()],
            notes: HashMap::new(),
        }
        .build(&VenuesConfig {
            cexs: vec!["binance".to_string()],
            dexs: vec![],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_paper_venue_records_orders() {
        let venue = PaperVenue::new("paper");

        venue.place_order(&order()).await.unwrap();
        venue.place_order(&order()).await.unwrap();

        let recorded = venue.orders().await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].buy_symbol, "FOO");
    }

    #[tokio::test]
    async fn test_paper_placement_has_leg_id() {
        let venue = PaperVenue::new("paper");
        let placement = venue.place_order(&order()).await.unwrap();
        let Placement::Cex { leg_ids } = placement else {
            panic!("expected CEX-style placement");
        };
        assert_eq!(leg_ids, vec!["paper-1".to_string()]);
    }
}
