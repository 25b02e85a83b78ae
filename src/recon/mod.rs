//! Post-listing market reconnaissance
//!
//! Samples CEX and DEX prices around a detected listing and appends them to
//! disk for offline analysis. Runs alongside the live pipeline but never
//! feeds back into it.

mod recorder;

pub use recorder::{PriceSample, SampleWriter};

use crate::chain::{from_token_units, to_token_units, Address, DexChain};
use crate::config::ReconConfig;
use crate::detector::Listing;
use crate::resolver::AddressResolver;
use crate::venue::CexApi;
use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Samples market data for each detected listing
pub struct ReconRunner {
    writer: SampleWriter,
    quote_symbol: String,
    sample_interval: Duration,
    sample_window: Duration,
    cex: Option<Arc<dyn CexApi>>,
    dex: Option<Arc<dyn DexChain>>,
    resolver: Option<Arc<AddressResolver>>,
}

impl ReconRunner {
    pub fn new(config: &ReconConfig, quote_symbol: impl Into<String>) -> Self {
        Self {
            writer: SampleWriter::new(&config.data_dir),
            quote_symbol: quote_symbol.into().to_uppercase(),
            sample_interval: Duration::from_secs(config.sample_interval_secs),
            sample_window: Duration::from_secs(config.sample_window_secs),
            cex: None,
            dex: None,
            resolver: None,
        }
    }

    pub fn with_cex(mut self, cex: Arc<dyn CexApi>) -> Self {
        self.cex = Some(cex);
        self
    }

    pub fn with_dex(mut self, dex: Arc<dyn DexChain>, resolver: Arc<AddressResolver>) -> Self {
        self.dex = Some(dex);
        self.resolver = Some(resolver);
        self
    }

    /// Consume detected listings until the channel closes; each listing gets
    /// its own sampling task so a long window never delays the next listing.
    pub async fn run(self: Arc<Self>, mut listing_rx: mpsc::Receiver<Listing>) -> anyhow::Result<()> {
        while let Some(listing) = listing_rx.recv().await {
            tracing::info!(symbol = %listing.symbol, "Sampling market data for listing");
            let runner = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = runner.sample_listing(&listing).await {
                    tracing::error!(symbol = %listing.symbol, error = %e, "Sampling failed");
                }
            });
        }
        Ok(())
    }

    async fn sample_listing(&self, listing: &Listing) -> anyhow::Result<()> {
        let dex_pair = self.resolve_dex_pair(listing).await;

        let started = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(self.sample_interval);
        while started.elapsed() < self.sample_window {
            ticker.tick().await;

            if let Some(cex) = &self.cex {
                match cex.ticker_price(&listing.symbol, &self.quote_symbol).await {
                    Ok(price) => self.record("binance", listing, price)?,
                    Err(e) => {
                        tracing::debug!(symbol = %listing.symbol, error = %e, "CEX sample unavailable")
                    }
                }
            }

            if let (Some(dex), Some((base, base_decimals, quote, quote_decimals))) =
                (&self.dex, &dex_pair)
            {
                match Self::dex_price(dex.as_ref(), *base, *base_decimals, *quote, *quote_decimals)
                    .await
                {
                    Ok(price) => self.record("pancakeswapv2", listing, price)?,
                    Err(e) => {
                        tracing::debug!(symbol = %listing.symbol, error = %e, "DEX sample unavailable")
                    }
                }
            }
        }

        tracing::info!(symbol = %listing.symbol, "Sampling window finished");
        Ok(())
    }

    /// Resolve the pool tokens once up front. Failures only disable the DEX
    /// side of sampling.
    async fn resolve_dex_pair(&self, listing: &Listing) -> Option<(Address, u8, Address, u8)> {
        let (dex, resolver) = match (&self.dex, &self.resolver) {
            (Some(dex), Some(resolver)) => (dex, resolver),
            _ => return None,
        };

        let base = resolver
            .resolve(&listing.symbol, Some(&listing.token_name))
            .await
            .ok()
            .and_then(|a| Address::from_str(&a).ok())?;
        let quote = resolver
            .resolve(&self.quote_symbol, None)
            .await
            .ok()
            .and_then(|a| Address::from_str(&a).ok())?;

        let base_decimals = dex.token_decimals(base).await.ok()?;
        let quote_decimals = dex.token_decimals(quote).await.ok()?;
        Some((base, base_decimals, quote, quote_decimals))
    }

    /// Quote-per-base price from the router: the output of selling one base
    /// unit into the pool.
    async fn dex_price(
        dex: &dyn DexChain,
        base: Address,
        base_decimals: u8,
        quote: Address,
        quote_decimals: u8,
    ) -> anyhow::Result<Decimal> {
        let one_base = to_token_units(Decimal::ONE, base_decimals)?;
        let out = dex.amount_out(one_base, &[base, quote]).await?;
        Ok(from_token_units(out, quote_decimals)?)
    }

    fn record(&self, venue: &str, listing: &Listing, price: Decimal) -> anyhow::Result<()> {
        self.writer.append(&PriceSample {
            venue: venue.to_string(),
            base: listing.symbol.clone(),
            quote: self.quote_symbol.clone(),
            price,
            sampled_at: Utc::now(),
        })
    }
}
