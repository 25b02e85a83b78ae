//! Blockchain access
//!
//! Traits over the RPC surface the venue clients need, an EVM implementation,
//! constant-product quoting, and serialized nonce allocation.

mod amm;
mod evm;
mod nonce;

pub use amm::constant_product_out;
pub use evm::EvmChain;
pub use nonce::NonceAllocator;

pub use alloy::primitives::{Address, B256, U256};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Chain access errors
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport or node availability problem, safe to retry
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// The node actively refused the request (underpriced transaction,
    /// insufficient funds). Never retried automatically.
    #[error("node rejected transaction: {0}")]
    Rejected(String),
    #[error("token amount out of range: {0}")]
    Amount(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A swap instruction ready for signing and submission
#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub sell_token: Address,
    pub buy_token: Address,
    /// Amount of sell token, in token units
    pub sell_amount: U256,
    /// Minimum acceptable buy amount, in token units
    pub min_buy_amount: U256,
    /// Unix timestamp after which the router must refuse the swap
    pub deadline: u64,
    /// Gas price in wei
    pub gas_price: u128,
}

/// Handle returned by a successful submission
#[derive(Debug, Clone)]
pub struct SwapSubmission {
    pub tx_hash: B256,
    pub nonce: u64,
    pub gas_price: u128,
}

/// The RPC surface a DEX venue client needs
#[async_trait]
pub trait DexChain: Send + Sync {
    /// Whether a liquidity pool exists for the unordered token pair.
    async fn pool_exists(&self, token_a: Address, token_b: Address) -> Result<bool, ChainError>;

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError>;

    /// Router-computed output amount for an exact input, fees included.
    async fn amount_out(&self, amount_in: U256, path: &[Address; 2]) -> Result<U256, ChainError>;

    /// Router-computed input amount needed for an exact output.
    async fn amount_in(&self, amount_out: U256, path: &[Address; 2]) -> Result<U256, ChainError>;

    /// Current network gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Sign and submit a swap. The nonce is allocated by the implementation.
    async fn submit_swap(&self, swap: SwapOrder) -> Result<SwapSubmission, ChainError>;
}

/// Receipt polling for submitted transactions
#[async_trait]
pub trait TxWatcher: Send + Sync {
    /// `Ok(Some(true))` mined and succeeded, `Ok(Some(false))` mined and
    /// reverted, `Ok(None)` not yet included.
    async fn receipt_status(&self, tx_hash: B256) -> Result<Option<bool>, ChainError>;
}

/// Convert a decimal token amount to on-chain integer units.
pub fn to_token_units(amount: Decimal, decimals: u8) -> Result<U256, ChainError> {
    if decimals > 19 {
        return Err(ChainError::Amount(format!(
            "unsupported token decimals: {decimals}"
        )));
    }
    let scale = Decimal::from(10u64.pow(decimals as u32));
    let scaled = (amount * scale).trunc();
    let units = scaled
        .to_u128()
        .ok_or_else(|| ChainError::Amount(format!("{amount} does not fit in token units")))?;
    Ok(U256::from(units))
}

/// Convert on-chain integer units back to a decimal token amount.
pub fn from_token_units(units: U256, decimals: u8) -> Result<Decimal, ChainError> {
    if decimals > 19 {
        return Err(ChainError::Amount(format!(
            "unsupported token decimals: {decimals}"
        )));
    }
    let raw: u128 = units
        .try_into()
        .map_err(|_| ChainError::Amount(format!("{units} exceeds u128")))?;
    let scale = Decimal::from(10u64.pow(decimals as u32));
    let exact = if raw <= u64::MAX as u128 {
        Decimal::from(raw as u64)
    } else {
        use std::str::FromStr;
        Decimal::from_str(&raw.to_string()).map_err(|e| ChainError::Amount(e.to_string()))?
    };
    Ok(exact / scale)
}

/// Scale a wei gas price by a decimal multiplier using integer math.
pub fn scale_gas_price(gas_price: u128, multiplier: Decimal) -> u128 {
    let milli = (multiplier * Decimal::from(1000u64))
        .trunc()
        .to_u128()
        .unwrap_or(1000);
    gas_price.saturating_mul(milli) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_token_units() {
        assert_eq!(to_token_units(dec!(1), 18).unwrap(), U256::from(10u128.pow(18)));
        assert_eq!(to_token_units(dec!(0.5), 18).unwrap(), U256::from(5 * 10u128.pow(17)));
        assert_eq!(to_token_units(dec!(1.25), 6).unwrap(), U256::from(1_250_000u64));
    }

    #[test]
    fn test_from_token_units() {
        assert_eq!(from_token_units(U256::from(10u128.pow(18)), 18).unwrap(), dec!(1));
        assert_eq!(from_token_units(U256::from(1_250_000u64), 6).unwrap(), dec!(1.25));
    }

    #[test]
    fn test_round_trip_truncates_excess_precision() {
        // 18 decimals cannot hold a 20-decimal fraction; the tail is dropped
        let units = to_token_units(dec!(0.000000000000000001), 18).unwrap();
        assert_eq!(units, U256::from(1u64));
    }

    #[test]
    fn test_unsupported_decimals_rejected() {
        assert!(to_token_units(dec!(1), 30).is_err());
        assert!(from_token_units(U256::from(1u64), 30).is_err());
    }

    #[test]
    fn test_scale_gas_price() {
        assert_eq!(scale_gas_price(5_000_000_000, dec!(1.4)), 7_000_000_000);
        assert_eq!(scale_gas_price(5_000_000_000, dec!(1)), 5_000_000_000);
        assert_eq!(scale_gas_price(0, dec!(1.4)), 0);
    }
}
