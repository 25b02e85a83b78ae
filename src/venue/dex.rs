//! DEX venue client
//!
//! Builds an AMM router swap from resolved token addresses: quantity
//! conversion and market-order output bounds are delegated to the router's
//! own computation, limit orders bypass the liquidity curve entirely.

use super::{Placement, VenueClient, VenueError};
use crate::chain::{
    from_token_units, scale_gas_price, to_token_units, Address, B256, DexChain, SwapOrder,
};
use crate::config::ChainConfig;
use crate::order::{AssetClass, Order, OrderType};
use crate::resolver::AddressResolver;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// A submitted swap with the amounts it was built from
#[derive(Debug, Clone)]
pub struct DexPlacement {
    pub tx_hash: B256,
    pub nonce: u64,
    pub gas_price: u128,
    pub sell_quantity: Decimal,
    pub min_buy_quantity: Decimal,
    pub deadline: DateTime<Utc>,
}

/// Decentralized exchange venue client
pub struct DexVenue<C: DexChain> {
    name: String,
    chain: Arc<C>,
    resolver: Arc<AddressResolver>,
    slippage: Decimal,
    gas_price_multiplier: Decimal,
    deadline_secs: u64,
}

impl<C: DexChain> DexVenue<C> {
    pub fn new(
        name: impl Into<String>,
        chain: Arc<C>,
        resolver: Arc<AddressResolver>,
        config: &ChainConfig,
    ) -> Self {
        Self {
            name: name.into(),
            chain,
            resolver,
            slippage: config.slippage,
            gas_price_multiplier: config.gas_price_multiplier,
            deadline_secs: config.deadline_secs,
        }
    }

    async fn resolve_token(
        &self,
        symbol: &str,
        name_hint: Option<&str>,
    ) -> Result<Address, VenueError> {
        let resolved = self.resolver.resolve(symbol, name_hint).await?;
        Address::from_str(&resolved)
            .map_err(|_| VenueError::Unsupported(format!("unusable address for {symbol}: {resolved}")))
    }
}

#[async_trait::async_trait]
impl<C: DexChain> VenueClient for DexVenue<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn place_order(&self, order: &Order) -> Result<Placement, VenueError> {
        if order.asset_class != AssetClass::Spot {
            return Err(VenueError::Unsupported(format!(
                "only spot orders trade against an AMM pool, got {:?}",
                order.asset_class
            )));
        }

        tracing::info!(order_id = %order.id, venue = %self.name, "Placing DEX order");

        let buy_address = self
            .resolve_token(
                &order.buy_symbol,
                order.notes.get("buy_token_name").map(String::as_str),
            )
            .await?;
        let sell_address = self
            .resolve_token(
                &order.sell_symbol,
                order.notes.get("sell_token_name").map(String::as_str),
            )
            .await?;

        if !self.chain.pool_exists(sell_address, buy_address).await? {
            return Err(VenueError::NoLiquidityPool {
                buy: order.buy_symbol.clone(),
                sell: order.sell_symbol.clone(),
            });
        }

        let sell_decimals = self.chain.token_decimals(sell_address).await?;
        let buy_decimals = self.chain.token_decimals(buy_address).await?;
        let path = [sell_address, buy_address];

        // A buy-denominated order converts to a sell quantity via the router
        let sell_quantity = if order.quantity_to_sell.is_zero() {
            let buy_units = to_token_units(order.quantity_to_buy, buy_decimals)
                .map_err(VenueError::from)?;
            let units_in = self.chain.amount_in(buy_units, &path).await?;
            from_token_units(units_in, sell_decimals).map_err(VenueError::from)?
        } else {
            order.quantity_to_sell
        };
        let sell_units = to_token_units(sell_quantity, sell_decimals).map_err(VenueError::from)?;

        let min_buy_quantity = match (order.order_type, order.price_in_sell) {
            (OrderType::Limit, Some(price)) => {
                // The caller requested a fixed-price fill; the liquidity
                // curve plays no part in the bound.
                sell_quantity / price
            }
            _ => {
                let quoted = self.chain.amount_out(sell_units, &path).await?;
                from_token_units(quoted, buy_decimals).map_err(VenueError::from)?
                    * (Decimal::ONE - self.slippage)
            }
        };
        let min_buy_units =
            to_token_units(min_buy_quantity, buy_decimals).map_err(VenueError::from)?;

        let gas_price = scale_gas_price(
            self.chain.gas_price().await?,
            self.gas_price_multiplier,
        );
        let deadline = Utc::now() + chrono::Duration::seconds(self.deadline_secs as i64);

        let submission = self
            .chain
            .submit_swap(SwapOrder {
                sell_token: sell_address,
                buy_token: buy_address,
                sell_amount: sell_units,
                min_buy_amount: min_buy_units,
                deadline: deadline.timestamp() as u64,
                gas_price,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            tx_hash = %submission.tx_hash,
            nonce = submission.nonce,
            sell_quantity = %sell_quantity,
            min_buy_quantity = %min_buy_quantity,
            "Swap submitted"
        );

        Ok(Placement::Dex(DexPlacement {
            tx_hash: submission.tx_hash,
            nonce: submission.nonce,
            gas_price: submission.gas_price,
            sell_quantity,
            min_buy_quantity,
            deadline,
        }))
    }
}
