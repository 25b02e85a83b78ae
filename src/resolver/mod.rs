//! Symbol to contract address resolution
//!
//! Cache-first lookup over multiple independent data providers. An address is
//! trusted only when every provider returns the same one; swapping the wrong
//! token cannot be undone once a transaction is broadcast, so disagreement is
//! an error, never a guess.

mod cache;
mod coingecko;
mod coinmarketcap;

pub use cache::AddressCache;
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use coinmarketcap::{CoinMarketCapClient, CoinMarketCapConfig};

use crate::config::ResolverConfig;
use async_trait::async_trait;
use thiserror::Error;

/// Address resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Providers disagreed or not all of them answered
    #[error("no provider consensus for {symbol} on {chain}/{network}: {candidates:?}")]
    NoConsensus {
        symbol: String,
        chain: String,
        network: String,
        /// One entry per provider; `None` marks a failed lookup
        candidates: Vec<Option<String>>,
    },
    #[error("provider {provider} failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
    #[error("provider {provider} returned an invalid address: {address}")]
    InvalidAddress {
        provider: &'static str,
        address: String,
    },
    #[error("address cache error: {0}")]
    Cache(String),
}

/// A single lookup against one external provider
#[derive(Debug, Clone)]
pub struct AddressQuery<'a> {
    pub symbol: &'a str,
    pub token_name: Option<&'a str>,
    pub chain: &'a str,
    pub network: &'a str,
}

/// An independent external source of contract addresses
#[async_trait]
pub trait AddressProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Look up the contract address for a symbol. Implementations return a
    /// checksummed address string.
    async fn contract_address(&self, query: &AddressQuery<'_>) -> Result<String, ResolveError>;
}

/// Providers name tokens inconsistently ("basic attention token",
/// "basic-attention-token", "Basic Attention Token"), so generate the
/// variants a provider may match on.
pub fn name_formats(token_name: &str) -> Vec<String> {
    let words: Vec<&str> = token_name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let upper: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();
    let capitalized: Vec<String> = lower
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    let mut formats = Vec::new();
    for words in [&lower, &upper, &capitalized] {
        for separator in ["_", "-", " "] {
            formats.push(words.join(separator));
        }
    }
    formats
}

/// Resolves symbols to contract addresses with a local cache in front of
/// provider consensus
pub struct AddressResolver {
    cache: AddressCache,
    providers: Vec<Box<dyn AddressProvider>>,
    chain: String,
    network: String,
}

impl AddressResolver {
    /// Build the production resolver with both configured providers.
    pub fn new(config: &ResolverConfig) -> Self {
        let providers: Vec<Box<dyn AddressProvider>> = vec![
            Box::new(CoinMarketCapClient::new(CoinMarketCapConfig {
                base_url: config.coinmarketcap_url.clone(),
                api_key: config.coinmarketcap_api_key.clone(),
                ..CoinMarketCapConfig::default()
            })),
            Box::new(CoinGeckoClient::new(CoinGeckoConfig {
                base_url: config.coingecko_url.clone(),
                ..CoinGeckoConfig::default()
            })),
        ];
        Self::with_providers(
            AddressCache::new(&config.cache_path),
            providers,
            &config.chain,
            &config.network,
        )
    }

    /// Build a resolver from explicit parts.
    pub fn with_providers(
        cache: AddressCache,
        providers: Vec<Box<dyn AddressProvider>>,
        chain: &str,
        network: &str,
    ) -> Self {
        Self {
            cache,
            providers,
            chain: chain.to_string(),
            network: network.to_string(),
        }
    }

    /// Resolve a symbol to a contract address.
    ///
    /// Cache hits return immediately. Otherwise every provider is queried
    /// concurrently; a unanimous answer is persisted to the cache and
    /// returned, anything else fails without caching.
    pub async fn resolve(
        &self,
        symbol: &str,
        token_name: Option<&str>,
    ) -> Result<String, ResolveError> {
        let symbol = symbol.to_uppercase();

        if let Some(address) = self.cache.get(&self.chain, &self.network, &symbol)? {
            tracing::debug!(%symbol, %address, "Address cache hit");
            return Ok(address);
        }

        let query = AddressQuery {
            symbol: &symbol,
            token_name,
            chain: &self.chain,
            network: &self.network,
        };

        let lookups = self
            .providers
            .iter()
            .map(|provider| provider.contract_address(&query));
        let results = futures_util::future::join_all(lookups).await;

        let mut candidates: Vec<Option<String>> = Vec::with_capacity(results.len());
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(address) => candidates.push(Some(address)),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider lookup failed");
                    candidates.push(None);
                }
            }
        }

        let mut distinct: Vec<&String> = candidates.iter().flatten().collect();
        distinct.dedup();
        let unanimous = candidates.iter().all(Option::is_some) && distinct.len() == 1;

        if unanimous {
            let address = distinct[0].clone();
            self.cache
                .put(&self.chain, &self.network, &symbol, &address)?;
            tracing::info!(%symbol, %address, "Address resolved and cached");
            Ok(address)
        } else {
            Err(ResolveError::NoConsensus {
                symbol,
                chain: self.chain.clone(),
                network: self.network.clone(),
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedProvider {
        name: &'static str,
        address: Option<&'static str>,
    }

    #[async_trait]
    impl AddressProvider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn contract_address(
            &self,
            _query: &AddressQuery<'_>,
        ) -> Result<String, ResolveError> {
            match self.address {
                Some(address) => Ok(address.to_string()),
                None => Err(ResolveError::Provider {
                    provider: self.name,
                    message: "lookup failed".to_string(),
                }),
            }
        }
    }

    const ADDRESS_A: &str = "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82";
    const ADDRESS_B: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";

    fn resolver_with(providers: Vec<Box<dyn AddressProvider>>) -> (AddressResolver, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = AddressCache::new(dir.path().join("addresses.json"));
        (
            AddressResolver::with_providers(cache, providers, "binance_smart_chain", "mainnet"),
            dir,
        )
    }

    #[tokio::test]
    async fn test_agreement_resolves_and_caches() {
        let (resolver, _dir) = resolver_with(vec![
            Box::new(FixedProvider {
                name: "a",
                address: Some(ADDRESS_A),
            }),
            Box::new(FixedProvider {
                name: "b",
                address: Some(ADDRESS_A),
            }),
        ]);

        let address = resolver.resolve("cake", None).await.unwrap();
        assert_eq!(address, ADDRESS_A);

        // Second lookup is served by the cache
        let cached = resolver
            .cache
            .get("binance_smart_chain", "mainnet", "CAKE")
            .unwrap();
        assert_eq!(cached.as_deref(), Some(ADDRESS_A));
    }

    #[tokio::test]
    async fn test_disagreement_fails_and_does_not_cache() {
        let (resolver, _dir) = resolver_with(vec![
            Box::new(FixedProvider {
                name: "a",
                address: Some(ADDRESS_A),
            }),
            Box::new(FixedProvider {
                name: "b",
                address: Some(ADDRESS_B),
            }),
        ]);

        let err = resolver.resolve("CAKE", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoConsensus { .. }));
        assert!(resolver
            .cache
            .get("binance_smart_chain", "mainnet", "CAKE")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_fails_resolution() {
        let (resolver, _dir) = resolver_with(vec![
            Box::new(FixedProvider {
                name: "a",
                address: Some(ADDRESS_A),
            }),
            Box::new(FixedProvider {
                name: "b",
                address: None,
            }),
        ]);

        let err = resolver.resolve("CAKE", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoConsensus { .. }));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        struct PanickingProvider;

        #[async_trait]
        impl AddressProvider for PanickingProvider {
            fn name(&self) -> &'static str {
                "panicking"
            }

            async fn contract_address(
                &self,
                _query: &AddressQuery<'_>,
            ) -> Result<String, ResolveError> {
                panic!("providers must not be queried on a cache hit");
            }
        }

        let (resolver, _dir) = resolver_with(vec![Box::new(PanickingProvider)]);
        resolver
            .cache
            .put("binance_smart_chain", "mainnet", "CAKE", ADDRESS_A)
            .unwrap();

        let address = resolver.resolve("cake", None).await.unwrap();
        assert_eq!(address, ADDRESS_A);
    }

    #[test]
    fn test_name_formats() {
        let formats = name_formats("thE-basIC Attention_Token");
        assert!(formats.contains(&"the_basic_attention_token".to_string()));
        assert!(formats.contains(&"the-basic-attention-token".to_string()));
        assert!(formats.contains(&"The Basic Attention Token".to_string()));
        assert!(formats.contains(&"THE BASIC ATTENTION TOKEN".to_string()));
    }
}
