//! Areas and assets: reference data logs are attached to.

use clap::{Args, Subcommand};

use crate::config::FarmConfig;
use crate::sync::FarmClient;

#[derive(Args)]
pub struct AreasCommand {
    #[command(subcommand)]
    pub command: AreasSubcommand,
}

#[derive(Subcommand)]
pub enum AreasSubcommand {
    /// Replace the local areas with the server's
    Refresh,

    /// List areas held on this device
    List,
}

impl AreasCommand {
    pub fn run(&self, config: &FarmConfig) -> Result<(), Box<dyn std::error::Error>> {
        let client = FarmClient::open(config)?;

        match &self.command {
            AreasSubcommand::Refresh => {
                let rt = tokio::runtime::Runtime::new()?;
                let result = rt.block_on(client.engine().refresh_areas());
                client.finish()?;
                println!("Updated {} area(s).", result?);
            }
            AreasSubcommand::List => {
                let areas = client.lifecycle().store().areas();
                if areas.is_empty() {
                    println!("No areas found. Run 'farm areas refresh' first.");
                    return Ok(());
                }
                for area in areas.iter() {
                    println!("{:<8} {}", area.tid, area.name);
                }
            }
        }

        Ok(())
    }
}

#[derive(Args)]
pub struct AssetsCommand {
    #[command(subcommand)]
    pub command: AssetsSubcommand,
}

#[derive(Subcommand)]
pub enum AssetsSubcommand {
    /// Replace the local assets with the server's
    Refresh,

    /// List assets held on this device
    List {
        /// Only equipment
        #[arg(long)]
        equipment: bool,
    },
}

impl AssetsCommand {
    pub fn run(&self, config: &FarmConfig) -> Result<(), Box<dyn std::error::Error>> {
        let client = FarmClient::open(config)?;

        match &self.command {
            AssetsSubcommand::Refresh => {
                let rt = tokio::runtime::Runtime::new()?;
                let result = rt.block_on(client.engine().refresh_assets());
                client.finish()?;
                println!("Updated {} asset(s).", result?);
            }
            AssetsSubcommand::List { equipment } => {
                let store = client.lifecycle().store();
                let assets = if *equipment {
                    store.equipment()
                } else {
                    store.assets().to_vec()
                };
                if assets.is_empty() {
                    println!("No assets found. Run 'farm assets refresh' first.");
                    return Ok(());
                }
                for asset in &assets {
                    println!(
                        "{:<8} {:<12} {}",
                        asset.id,
                        asset.asset_type.as_deref().unwrap_or("-"),
                        asset.name
                    );
                }
            }
        }

        Ok(())
    }
}
