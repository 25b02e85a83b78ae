//! Resolve command implementation

use crate::config::Config;
use crate::resolver::AddressResolver;
use clap::Args;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Symbol to resolve, e.g. CAKE
    pub symbol: String,

    /// Human-readable token name, helps disambiguate symbol collisions
    #[arg(long)]
    pub name: Option<String>,
}

impl ResolveArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let resolver = AddressResolver::new(&config.resolver);
        let address = resolver
            .resolve(&self.symbol, self.name.as_deref())
            .await?;
        println!("{}: {}", self.symbol.to_uppercase(), address);
        Ok(())
    }
}
