use clap::Subcommand;
use slotbook_core::{Config, ConfigError};

use super::{CommandResult, Output};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "slots", "look_ahead_days")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value; lists accept JSON or comma-separated labels
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, out: Output) -> CommandResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| ConfigError::UnknownKey(key.clone()))?;
            out.emit(&value, || println!("{value}"))?;
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!(%key, "config updated");
            out.emit(&config, || println!("ok"))?;
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let fields = serde_json::to_value(&config)?;
            out.emit(&config, || {
                if let Some(fields) = fields.as_object() {
                    for (key, value) in fields {
                        println!("{key} = {value}");
                    }
                }
            })?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            out.emit(&config, || println!("config reset to defaults"))?;
        }
    }
    Ok(())
}
