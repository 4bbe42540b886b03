//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::say::run_say;
use crate::core::config::{Config, ConfigKey};
use crate::ui::chat_loop::{run_chat, ChatOptions};
use crate::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(version)]
#[command(about = "A terminal chat client over a persistent WebSocket")]
#[command(
    long_about = "Tether is a full-screen terminal chat client. It keeps one WebSocket \
open to a chat server, shows streamed replies as they arrive and reconnects \
automatically when the connection drops.\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  PageUp/PageDown   Scroll through the transcript\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show commands and keys\n\
  /attach <path>... Attach up to 5 files\n\
  /quit             Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat server host and port, e.g. localhost:9000
    #[arg(long, global = true, value_name = "HOST[:PORT]")]
    pub host: Option<String>,

    /// Full WebSocket endpoint, overrides --host
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Write diagnostic logs to the given file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Show assistant replies verbatim
    #[arg(long, global = true)]
    pub no_markdown: bool,

    /// Disable syntax highlighting of code blocks
    #[arg(long, global = true)]
    pub no_syntax: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// Message text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set (host, url, markdown, syntax, theme)
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
}

impl Args {
    /// Applies command-line flags on top of the loaded configuration.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(url) = &self.url {
            config.url = Some(url.clone());
        }
        if self.no_markdown {
            config.markdown = Some(false);
        }
        if self.no_syntax {
            config.syntax = Some(false);
        }
        config
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn set_config_value(config: &mut Config, key: &str, value: &[String]) -> Result<String, String> {
    let key = ConfigKey::parse(key).map_err(|err| err.to_string())?;
    let value = value.join(" ");
    config.set(key, &value).map_err(|err| err.to_string())?;
    Ok(format!("✅ Set {} to: {}", key.as_str(), value.trim()))
}

fn unset_config_value(config: &mut Config, key: &str) -> Result<String, String> {
    let key = ConfigKey::parse(key).map_err(|err| err.to_string())?;
    config.unset(key);
    Ok(format!("✅ Unset {}", key.as_str()))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    if logging::init(args.log.as_deref())? {
        debug!(?args, "Logging initialized");
    }

    match &args.command {
        Some(Commands::Set { key, value }) => {
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            match set_config_value(&mut config, key, value) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                }
                Err(message) => {
                    eprintln!("❌ {message}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Some(Commands::Unset { key }) => {
            let mut config = Config::load()?;
            match unset_config_value(&mut config, key) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                }
                Err(message) => {
                    eprintln!("❌ {message}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Some(Commands::Config) => {
            Config::load()?.print_all();
            Ok(())
        }
        Some(Commands::Say { text }) => {
            let config = args.apply_overrides(Config::load()?);
            run_say(text.clone(), ChatOptions::from_config(&config)?).await
        }
        Some(Commands::Chat) | None => {
            let config = args.apply_overrides(Config::load()?);
            run_chat(ChatOptions::from_config(&config)?).await
        }
    }
}

#[cfg(test)]
mod tests;
