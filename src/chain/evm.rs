//! EVM chain client
//!
//! Wraps an alloy HTTP provider plus the UniswapV2-style factory and router
//! contracts. Swap transactions are signed locally with the trading key and
//! the account nonce comes from the serialized allocator.

use super::{ChainError, DexChain, NonceAllocator, SwapOrder, SwapSubmission, TxWatcher};
use crate::config::ChainConfig;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use std::str::FromStr;

sol! {
    #[sol(rpc)]
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    #[sol(rpc)]
    interface IUniswapV2Router {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function getAmountsIn(uint256 amountOut, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
    }

    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
    }
}

/// Client for an EVM chain hosting a UniswapV2-style exchange
pub struct EvmChain {
    provider: DynProvider,
    router_address: Address,
    factory_address: Address,
    wallet_address: Address,
    gas_limit: u64,
    nonces: NonceAllocator,
}

fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(raw).map_err(|_| ChainError::InvalidAddress(raw.to_string()))
}

fn classify_rpc(e: RpcError<TransportErrorKind>) -> ChainError {
    match e.as_error_resp() {
        Some(payload) => ChainError::Rejected(payload.message.to_string()),
        None => ChainError::Transport(e.to_string()),
    }
}

fn classify_contract(e: alloy::contract::Error) -> ChainError {
    match e {
        alloy::contract::Error::TransportError(t) => classify_rpc(t),
        other => ChainError::Transport(other.to_string()),
    }
}

impl EvmChain {
    /// Connect with the trading key loaded for signing.
    pub fn connect(config: &ChainConfig) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(config.private_key.trim())?;
        let wallet_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(config.rpc_url.parse()?)
            .erased();

        tracing::debug!(rpc_url = %config.rpc_url, wallet = %wallet_address, "Connected to chain");

        Ok(Self {
            provider,
            router_address: parse_address(&config.router_address)?,
            factory_address: parse_address(&config.factory_address)?,
            wallet_address,
            gas_limit: config.gas_limit,
            nonces: NonceAllocator::new(),
        })
    }

    /// Connect without a signer. Read calls work; submissions fail.
    pub fn connect_read_only(config: &ChainConfig) -> anyhow::Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url.parse()?)
            .erased();

        Ok(Self {
            provider,
            router_address: parse_address(&config.router_address)?,
            factory_address: parse_address(&config.factory_address)?,
            wallet_address: Address::ZERO,
            gas_limit: config.gas_limit,
            nonces: NonceAllocator::new(),
        })
    }

    /// Node reachability check; returns the latest block number.
    pub async fn health_check(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(classify_rpc)
    }
}

#[async_trait]
impl DexChain for EvmChain {
    async fn pool_exists(&self, token_a: Address, token_b: Address) -> Result<bool, ChainError> {
        let factory = IUniswapV2Factory::new(self.factory_address, self.provider.clone());
        let pair = factory
            .getPair(token_a, token_b)
            .call()
            .await
            .map_err(classify_contract)?;
        Ok(pair != Address::ZERO)
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        erc20.decimals().call().await.map_err(classify_contract)
    }

    async fn amount_out(&self, amount_in: U256, path: &[Address; 2]) -> Result<U256, ChainError> {
        let router = IUniswapV2Router::new(self.router_address, self.provider.clone());
        let amounts = router
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await
            .map_err(classify_contract)?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| ChainError::Transport("router returned no amounts".to_string()))
    }

    async fn amount_in(&self, amount_out: U256, path: &[Address; 2]) -> Result<U256, ChainError> {
        let router = IUniswapV2Router::new(self.router_address, self.provider.clone());
        let amounts = router
            .getAmountsIn(amount_out, path.to_vec())
            .call()
            .await
            .map_err(classify_contract)?;
        amounts
            .first()
            .copied()
            .ok_or_else(|| ChainError::Transport("router returned no amounts".to_string()))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(classify_rpc)
    }

    async fn submit_swap(&self, swap: SwapOrder) -> Result<SwapSubmission, ChainError> {
        let nonce = self
            .nonces
            .allocate(|| async {
                self.provider
                    .get_transaction_count(self.wallet_address)
                    .await
                    .map_err(classify_rpc)
            })
            .await?;

        let router = IUniswapV2Router::new(self.router_address, self.provider.clone());
        let call = router
            .swapExactTokensForTokens(
                swap.sell_amount,
                swap.min_buy_amount,
                vec![swap.sell_token, swap.buy_token],
                self.wallet_address,
                U256::from(swap.deadline),
            )
            .gas(self.gas_limit)
            .gas_price(swap.gas_price)
            .nonce(nonce);

        match call.send().await {
            Ok(pending) => Ok(SwapSubmission {
                tx_hash: *pending.tx_hash(),
                nonce,
                gas_price: swap.gas_price,
            }),
            Err(e) => {
                let mapped = classify_contract(e);
                if matches!(mapped, ChainError::Rejected(_)) {
                    // The allocated nonce never reached the mempool
                    self.nonces.reset().await;
                }
                Err(mapped)
            }
        }
    }
}

#[async_trait]
impl TxWatcher for EvmChain {
    async fn receipt_status(&self, tx_hash: B256) -> Result<Option<bool>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(classify_rpc)?;
        Ok(receipt.map(|r| r.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x10ED43C718714eb63d5aA57B78B54704E256024E").unwrap();
        assert_eq!(
            parsed.to_checksum(None),
            "0x10ED43C718714eb63d5aA57B78B54704E256024E"
        );
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(matches!(
            parse_address("not-an-address"),
            Err(ChainError::InvalidAddress(_))
        ));
    }
}
