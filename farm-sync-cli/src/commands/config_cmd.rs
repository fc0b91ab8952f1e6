use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::log::OutputFormat;
use crate::config::FarmConfig;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the config file path
    Path,

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &FarmConfig,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = cli_config_path.unwrap_or_else(FarmConfig::default_config_path);

        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!("Config file: {} (not found)", config_path.display());
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("farm.host: {}", config.farm.host.as_deref().unwrap_or("-"));
                        println!(
                            "farm.username: {}",
                            config.farm.username.as_deref().unwrap_or("-")
                        );
                        println!(
                            "farm.token: {}",
                            if config.farm.token.is_some() {
                                "(set)"
                            } else {
                                "-"
                            }
                        );
                        println!("farm.timeout_secs: {}", config.farm.timeout_secs);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Path => {
                println!("{}", config_path.display());
                Ok(())
            }

            ConfigSubcommand::Init => {
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'farm config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let default_config = r#"# farm configuration

# Directory for the local record snapshot (default: platform data dir)
# data_dir: ~/.local/share/farm

farm:
  # Farm server host
  host: https://myfarm.farmos.net
  # username: grower
  # token: ...
  timeout_secs: 30
"#;

                let mut file = fs::File::create(&config_path)?;
                file.write_all(default_config.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to add your server token.");
                Ok(())
            }
        }
    }
}
