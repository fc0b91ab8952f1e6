use clap::{Args, Subcommand, ValueEnum};
use serde_json::Value;

use farm_sync_core::models::is_reserved_field;
use farm_sync_core::{EntityKind, LocalId, Log, LogPatch, NewLog};

use crate::config::FarmConfig;
use crate::sync::FarmClient;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct LogCommand {
    #[command(subcommand)]
    pub command: LogSubcommand,
}

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Record a new log on this device
    Create {
        /// Log name
        #[arg(long, short)]
        name: String,

        /// Log type (e.g., farm_activity, farm_harvest, farm_input)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        log_type: Option<String>,

        /// Extra field as key=value (can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Edit a log; it will be pushed on the next sync
    Update {
        /// Local ID (or a unique prefix of it)
        local_id: String,

        /// New name
        #[arg(long, short)]
        name: Option<String>,

        /// Field to set as key=value (can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Remove a log from this device
    Delete {
        /// Local ID (or a unique prefix of it)
        local_id: String,
    },

    /// List logs held on this device
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove every log from this device
    Clear,
}

impl LogCommand {
    pub fn run(&self, config: &FarmConfig) -> Result<(), Box<dyn std::error::Error>> {
        let client = FarmClient::open(config)?;

        match &self.command {
            LogSubcommand::Create {
                name,
                log_type,
                fields,
            } => {
                let mut new_log = NewLog::new(name);
                if let Some(t) = log_type {
                    new_log = new_log.with_field("type", Value::String(t.clone()));
                }
                for field in fields {
                    let (key, value) = parse_field(field)?;
                    new_log = new_log.with_field(key, value);
                }

                let local_id = client.lifecycle().create(new_log);
                client.save()?;

                println!("Created log '{}'", name);
                println!("  Local ID: {}", local_id);
            }

            LogSubcommand::Update {
                local_id,
                name,
                fields,
            } => {
                let local_id = resolve_local_id(&client, local_id)?;
                let mut patch = LogPatch::new();
                if let Some(n) = name {
                    patch = patch.with_name(n);
                }
                for field in fields {
                    let (key, value) = parse_field(field)?;
                    patch = patch.with_field(key, value);
                }
                if patch.is_empty() {
                    return Err("Nothing to update. Use --name or --field.".into());
                }

                let log = client.lifecycle().update(local_id, patch)?;
                client.save()?;

                println!("Updated log '{}':", log.name);
                println!();
                print_log_details(&log);
            }

            LogSubcommand::Delete { local_id } => {
                let local_id = resolve_local_id(&client, local_id)?;
                let log = client.lifecycle().delete(local_id)?;
                client.save()?;

                println!("Deleted log '{}' ({})", log.name, log.local_id().short());
            }

            LogSubcommand::List { format } => {
                let logs = client.lifecycle().store().logs();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&*logs)?);
                    }
                    OutputFormat::Text => {
                        if logs.is_empty() {
                            println!("No logs found.");
                            return Ok(());
                        }
                        println!(
                            "{:<5} {:<10} {:<8} {:<16} {:<9} NAME",
                            "INDEX", "LOCAL ID", "ID", "TYPE", "STATUS"
                        );
                        for (index, log) in logs.iter().enumerate() {
                            println!(
                                "{:<5} {:<10} {:<8} {:<16} {:<9} {}",
                                index,
                                log.local_id().short(),
                                log.id().unwrap_or("-"),
                                log.log_type().unwrap_or("-"),
                                status(log),
                                log.name
                            );
                        }
                    }
                }
            }

            LogSubcommand::Clear => {
                let count = client.lifecycle().store().logs().len();
                client.lifecycle().clear_all(EntityKind::Logs);
                client.save()?;

                println!("Cleared {} log(s).", count);
            }
        }

        Ok(())
    }
}

fn status(log: &Log) -> &'static str {
    if log.was_pushed_to_server {
        "synced"
    } else if log.is_ready_to_sync {
        "pending"
    } else {
        "held"
    }
}

fn print_log_details(log: &Log) {
    println!("  Local ID: {}", log.local_id());
    if let Some(id) = log.id() {
        println!("  ID:       {}", id);
    }
    if let Some(t) = log.log_type() {
        println!("  Type:     {}", t);
    }
    println!("  Status:   {}", status(log));
    if !log.attached_assets.is_empty() {
        let names: Vec<String> = log.attached_assets.iter().map(|a| a.to_string()).collect();
        println!("  Assets:   {}", names.join(", "));
    }
    if !log.attached_areas.is_empty() {
        let names: Vec<&str> = log.attached_areas.iter().map(|a| a.name.as_str()).collect();
        println!("  Areas:    {}", names.join(", "));
    }
}

/// Accepts a full local ID or a prefix matching exactly one log.
fn resolve_local_id(client: &FarmClient, input: &str) -> Result<LocalId, String> {
    if let Ok(local_id) = input.parse::<LocalId>() {
        return Ok(local_id);
    }

    let prefix = input.to_lowercase();
    let matches: Vec<LocalId> = client
        .lifecycle()
        .store()
        .logs()
        .iter()
        .map(Log::local_id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [local_id] => Ok(*local_id),
        [] => Err(format!("Log not found: {}", input)),
        _ => Err(format!("Ambiguous local ID prefix: {}", input)),
    }
}

/// Parses `key=value`. The value is read as JSON when it parses (numbers,
/// booleans, objects) and kept as a string otherwise.
pub fn parse_field(input: &str) -> Result<(String, Value), String> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| format!("Invalid field '{}'. Use key=value.", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid field '{}'. Key is empty.", input));
    }
    if is_reserved_field(key) {
        return Err(format!(
            "Field '{}' is reserved and cannot be set with --field.",
            key
        ));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_rejects_reserved_keys() {
        for key in ["id", "name", "field_farm_asset", "field_farm_area"] {
            let err = parse_field(&format!("{}=x", key)).unwrap_err();
            assert!(err.contains("reserved"), "{}", err);
        }
        assert!(parse_field("notes=x").is_ok());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("done=true").unwrap(),
            ("done".to_string(), json!(true))
        );
        assert_eq!(
            parse_field("quantity=12.5").unwrap(),
            ("quantity".to_string(), json!(12.5))
        );
        assert_eq!(
            parse_field("notes=rain at noon").unwrap(),
            ("notes".to_string(), json!("rain at noon"))
        );
        assert_eq!(
            parse_field("expr=a=b").unwrap(),
            ("expr".to_string(), json!("a=b"))
        );
    }

    #[test]
    fn test_parse_field_errors() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=value").is_err());
    }

    #[test]
    fn test_status() {
        let draft = Log::new(LocalId::new(), "a");
        assert_eq!(status(&draft), "pending");
        assert_eq!(status(&draft.clone().with_pushed(true)), "synced");

        let mut held = draft;
        held.is_ready_to_sync = false;
        assert_eq!(status(&held), "held");
    }
}
