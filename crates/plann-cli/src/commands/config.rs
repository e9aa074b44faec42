use clap::Subcommand;
use plann_core::Config;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "planning.hours_per_day", "timezone.implicit")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value ("none" clears an optional value)
        value: String,
    },
    /// List all config values
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(ctx: &Context, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => match ctx.config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = ctx.config.clone();
            config.set(&key, &value)?;
            config.save_to(&ctx.config_path)?;
            println!("ok");
        }
        ConfigAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            } else {
                for (key, value) in ctx.config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            Config::default().save_to(&ctx.config_path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
