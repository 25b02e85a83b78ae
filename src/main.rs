use clap::Parser;
use listing_sniper::cli::{Cli, Commands};
use listing_sniper::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = listing_sniper::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting listing trader");
            args.execute(&config).await?;
        }
        Commands::Recon(args) => {
            tracing::info!("Starting listing recon");
            args.execute(&config).await?;
        }
        Commands::Resolve(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Detector: {} listings", config.detector.venue_name);
            println!(
                "  Trader: {} {} per listing on {:?}",
                config.trader.order_quantity, config.trader.quote_symbol, config.trader.venues
            );
            println!("  CEX venues: {:?}", config.venues.cexs);
            println!("  DEX venues: {:?}", config.venues.dexs);
            println!(
                "  Chain: {} (slippage {}, gas x{})",
                config.chain.rpc_url, config.chain.slippage, config.chain.gas_price_multiplier
            );
            println!(
                "  Handler: {} attempts, {}s confirmation timeout",
                config.handler.max_attempts, config.handler.confirmation_timeout_secs
            );
        }
    }

    Ok(())
}
