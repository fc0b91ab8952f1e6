mod config_cmd;
mod log;
mod reference;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use log::LogCommand;
pub use reference::{AreasCommand, AssetsCommand};
pub use sync_cmd::SyncCommand;
