//! Run command implementation
//!
//! Wires the live pipeline: stream listener, strategy, order handler, and
//! venue clients, joined by bounded channels.

use crate::chain::EvmChain;
use crate::config::Config;
use crate::detector::ListingDetector;
use crate::handler::OrderHandler;
use crate::resolver::AddressResolver;
use crate::retry::RetryPolicy;
use crate::strategy::StrategyDriver;
use crate::stream::{SocialStream, TwitterStream, TwitterStreamConfig};
use crate::venue::{BinanceConfig, BinanceRest, CexVenue, DexVenue, PaperVenue};
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Accept orders on a paper venue instead of submitting anywhere
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (order_tx, order_rx) = mpsc::channel(config.handler.queue_depth);

        let mut handler = OrderHandler::new(&config.handler);

        if self.dry_run {
            tracing::warn!("Dry run: orders are recorded, not submitted");
            let paper = Arc::new(PaperVenue::new("paper"));
            for venue in config.venues.cexs.iter().chain(config.venues.dexs.iter()) {
                handler.register(venue.as_str(), paper.clone());
            }
        } else {
            let cex = Arc::new(CexVenue::new(
                "binance",
                BinanceRest::new(BinanceConfig::from_config(&config.cex)),
                config.trader.quote_symbol.as_str(),
                RetryPolicy::from_config(&config.retry),
            ));
            for venue in &config.venues.cexs {
                handler.register(venue.as_str(), cex.clone());
            }

            let chain = Arc::new(EvmChain::connect(&config.chain)?);
            let block = chain.health_check().await?;
            tracing::info!(block, "Chain reachable");

            let resolver = Arc::new(AddressResolver::new(&config.resolver));
            let dex = Arc::new(DexVenue::new(
                "pancakeswapv2",
                chain.clone(),
                resolver,
                &config.chain,
            ));
            for venue in &config.venues.dexs {
                handler.register(venue.as_str(), dex.clone());
            }
            handler.set_chain_watcher(chain);
        }

        let stream = TwitterStream::new(TwitterStreamConfig::from_config(&config.stream));
        let message_rx = stream.subscribe().await?;

        let strategy = StrategyDriver::new(
            ListingDetector::new(&config.detector.venue_name),
            config.venues.clone(),
            config.trader.clone(),
        );

        let strategy_task = tokio::spawn(strategy.run(message_rx, order_tx.clone()));
        let handler_task = tokio::spawn(Arc::new(handler).run(order_rx, order_tx));

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
            result = strategy_task => {
                result??;
                tracing::warn!("Strategy stopped");
            }
            result = handler_task => {
                result??;
                tracing::warn!("Order handler stopped");
            }
        }

        Ok(())
    }
}
