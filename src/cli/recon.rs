//! Recon command implementation
//!
//! Runs the stream and detector with trading disabled and samples market
//! data around each detected listing.

use crate::chain::EvmChain;
use crate::config::Config;
use crate::detector::ListingDetector;
use crate::recon::ReconRunner;
use crate::resolver::AddressResolver;
use crate::stream::{SocialStream, TwitterStream, TwitterStreamConfig};
use crate::venue::{BinanceConfig, BinanceRest};
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug)]
pub struct ReconArgs {
    /// Skip DEX sampling (no chain connection needed)
    #[arg(long)]
    pub cex_only: bool,
}

impl ReconArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut runner = ReconRunner::new(&config.recon, config.trader.quote_symbol.as_str())
            .with_cex(Arc::new(BinanceRest::new(BinanceConfig::from_config(&config.cex))));

        if !self.cex_only {
            let chain = Arc::new(EvmChain::connect_read_only(&config.chain)?);
            let resolver = Arc::new(AddressResolver::new(&config.resolver));
            runner = runner.with_dex(chain, resolver);
        }

        let stream = TwitterStream::new(TwitterStreamConfig::from_config(&config.stream));
        let mut message_rx = stream.subscribe().await?;

        let detector = ListingDetector::new(&config.detector.venue_name);
        let (listing_tx, listing_rx) = mpsc::channel(16);

        let detect_task = tokio::spawn(async move {
            while let Some(message) = message_rx.recv().await {
                if let Some(listing) = detector.detect(&message.text) {
                    tracing::info!(symbol = %listing.symbol, "Listing detected");
                    if listing_tx.send(listing).await.is_err() {
                        break;
                    }
                }
            }
        });
        let recon_task = tokio::spawn(Arc::new(runner).run(listing_rx));

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
            result = detect_task => {
                result?;
                tracing::warn!("Stream ended");
            }
            result = recon_task => {
                result??;
                tracing::warn!("Recon runner stopped");
            }
        }

        Ok(())
    }
}
