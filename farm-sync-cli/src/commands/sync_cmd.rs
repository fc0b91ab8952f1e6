//! Sync CLI commands for exchanging logs with the farm server.

use clap::{Args, Subcommand};

use farm_sync_core::sync::settle_all;
use farm_sync_core::{LogFilter, PullReport, PushOutcome, SyncError};

use super::log::parse_field;
use crate::config::FarmConfig;
use crate::sync::{FarmClient, FarmClientError};

/// Sync with the farm server (pull, then push pending logs)
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Fetch logs from the server and store the ones not held locally
    Pull {
        /// Only logs of this type (can be repeated)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        types: Vec<String>,

        /// Only logs whose field matches, as key=value (can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Send local logs to the server
    Push {
        /// Indices from `farm log list` (default: every pending log)
        indices: Vec<usize>,
    },

    /// Show sync configuration and the last sync time
    Status,
}

impl SyncCommand {
    pub fn run(&self, config: &FarmConfig) -> Result<(), SyncCommandError> {
        // Use tokio runtime for async operations
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| SyncCommandError::RuntimeError(e.to_string()))?;

        match &self.command {
            None => rt.block_on(self.sync(config)),
            Some(SyncSubcommand::Pull { types, fields }) => {
                let filter = build_filter(types, fields)?;
                rt.block_on(self.pull(config, &filter))
            }
            Some(SyncSubcommand::Push { indices }) => rt.block_on(self.push(config, indices)),
            Some(SyncSubcommand::Status) => self.status(config),
        }
    }

    async fn sync(&self, config: &FarmConfig) -> Result<(), SyncCommandError> {
        let client = FarmClient::open(config)?;
        let indices = client.engine().pending_indices();

        println!("Syncing with {}...", host_label(config));
        println!();

        let result = client.engine().sync(&LogFilter::new(), &indices).await;
        if let Ok(report) = &result {
            print_pull_report(&report.pull);
            print_push_outcomes(&report.push);
        }
        client.finish()?;
        result?;

        println!();
        println!("Sync complete.");
        Ok(())
    }

    async fn pull(&self, config: &FarmConfig, filter: &LogFilter) -> Result<(), SyncCommandError> {
        let client = FarmClient::open(config)?;

        println!("Pulling logs from {}...", host_label(config));
        println!();

        let result = client.pull(filter).await;
        if let Ok(report) = &result {
            print_pull_report(report);
        }
        client.finish()?;
        result?;

        Ok(())
    }

    async fn push(&self, config: &FarmConfig, indices: &[usize]) -> Result<(), SyncCommandError> {
        let client = FarmClient::open(config)?;
        let indices = if indices.is_empty() {
            client.engine().pending_indices()
        } else {
            indices.to_vec()
        };

        if indices.is_empty() {
            println!("Nothing to push.");
            return Ok(());
        }

        println!("Pushing {} log(s) to {}...", indices.len(), host_label(config));
        println!();

        let tasks = match client.engine().push(&indices) {
            Ok(tasks) => tasks,
            Err(e) => {
                client.finish()?;
                return Err(e.into());
            }
        };

        let mut outcomes = Vec::new();
        let mut first_error = None;
        for result in settle_all(tasks).await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    println!("  ✗ {}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        print_push_outcomes(&outcomes);
        client.finish()?;

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn status(&self, config: &FarmConfig) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  farm:");
            println!("    host: \"https://myfarm.farmos.net\"");
            println!("    token: \"...\"");
            println!();
            println!("Or set environment variables:");
            println!("  FARM_HOST, FARM_TOKEN");
            return Ok(());
        }

        println!("Server:    {}", host_label(config));
        if let Some(username) = &config.farm.username {
            println!("User:      {}", username);
        }
        println!("Timeout:   {}s", config.farm.timeout_secs);

        let client = FarmClient::open(config)?;
        match client.clock().last_sync() {
            Some(at) => println!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last sync: never"),
        }
        println!(
            "Pending:   {} log(s)",
            client.engine().pending_indices().len()
        );

        Ok(())
    }
}

fn host_label(config: &FarmConfig) -> &str {
    config.farm.host.as_deref().unwrap_or("(no host)")
}

/// Builds a pull filter from `--type` and `--field` arguments.
fn build_filter(types: &[String], fields: &[String]) -> Result<LogFilter, SyncCommandError> {
    let mut filter = LogFilter::new();
    for t in types {
        filter = filter.with_criterion("type", t);
    }
    for field in fields {
        let (key, value) = parse_field(field).map_err(SyncCommandError::InvalidArgument)?;
        let text = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        filter = filter.with_criterion(key, text);
    }
    Ok(filter)
}

fn print_pull_report(report: &PullReport) {
    println!(
        "  ✓ pulled {} log{} ({} new, {} already synced, {} with local edits)",
        report.fetched,
        if report.fetched == 1 { "" } else { "s" },
        report.added,
        report.already_synced,
        report.kept_local
    );
}

fn print_push_outcomes(outcomes: &[PushOutcome]) {
    for outcome in outcomes {
        match outcome {
            PushOutcome::Pushed { local_id, id, .. } => {
                println!(
                    "  ✓ pushed {} as #{}",
                    local_id.short(),
                    id.as_deref().unwrap_or("?")
                );
            }
            PushOutcome::Failed { local_id, category } => {
                println!("  ✗ {} - {}", local_id.short(), category);
            }
        }
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    ClientError(FarmClientError),
    SyncError(SyncError),
    InvalidArgument(String),
    RuntimeError(String),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::ClientError(e) => write!(f, "{}", e),
            SyncCommandError::SyncError(e) => write!(f, "{}", e),
            SyncCommandError::InvalidArgument(e) => write!(f, "{}", e),
            SyncCommandError::RuntimeError(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::ClientError(e) => Some(e),
            SyncCommandError::SyncError(e) => Some(e),
            SyncCommandError::InvalidArgument(_) | SyncCommandError::RuntimeError(_) => None,
        }
    }
}

impl From<FarmClientError> for SyncCommandError {
    fn from(e: FarmClientError) -> Self {
        SyncCommandError::ClientError(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::SyncError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let filter = build_filter(
            &["farm_seeding".to_string(), "farm_input".to_string()],
            &["done=1".to_string(), "area=North".to_string()],
        )
        .unwrap();

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("area".to_string(), "North".to_string()),
                ("done".to_string(), "1".to_string()),
                ("type".to_string(), "farm_seeding".to_string()),
                ("type".to_string(), "farm_input".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_filter_rejects_bad_field() {
        assert!(matches!(
            build_filter(&[], &["oops".to_string()]),
            Err(SyncCommandError::InvalidArgument(_))
        ));
    }
}
