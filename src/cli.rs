//! Command line definitions and the operator commands.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use osw_core::QueueMessage;
use osw_core::config::AppConfig;
use osw_core::traits::bus::MessageBus;

/// OSW Formatter: OSW ⇄ OSM conversion worker
#[derive(Debug, Parser)]
#[command(name = "osw-formatter", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (replaces `config/default.toml`)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(long, env = "OSW_ENV", default_value = "development")]
    pub env: String,

    /// Command to run (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Default, Subcommand)]
pub enum Commands {
    /// Subscribe to the listening topic and process jobs
    #[default]
    Serve,
    /// Publish a message file onto a bus topic
    Publish(PublishArgs),
    /// Load and validate configuration, then print it
    CheckConfig,
}

/// Arguments for the publish command
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Destination topic (defaults to the listening topic)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// JSON file holding one message envelope
    pub file: PathBuf,
}

/// Push one envelope onto the configured bus.
///
/// Only useful against a shared bus; the in-memory bus drops the message
/// when this process exits.
pub async fn publish(config: &AppConfig, args: &PublishArgs) -> anyhow::Result<()> {
    let body = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let message = QueueMessage::from_slice(&body)
        .with_context(|| format!("{} is not a message envelope", args.file.display()))?;

    let topic = args
        .topic
        .clone()
        .unwrap_or_else(|| config.bus.listening_topic.clone());
    let bus = osw_bus::connect(&config.bus)
        .await
        .context("Failed to connect to message bus")?;
    bus.publish(&topic, &message)
        .await
        .with_context(|| format!("Failed to publish to '{topic}'"))?;

    println!("Published message '{}' to '{}'", message.message_id, topic);
    Ok(())
}

/// Print the effective configuration with credentials masked.
pub fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = render_config(config)?;
    println!("Configuration is valid");
    println!("{rendered}");
    Ok(())
}

fn render_config(config: &AppConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    shown.bus.redis_url = mask_password(&config.bus.redis_url);
    serde_json::to_string_pretty(&shown).context("Failed to render configuration")
}

/// Mask the password in a connection URL for display.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map_or(0, |i| i + 3);
    if let Some(at_pos) = url[scheme_end..].find('@').map(|i| i + scheme_end) {
        if let Some(colon_pos) = url[scheme_end..at_pos].find(':').map(|i| i + scheme_end) {
            return format!("{}****{}", &url[..=colon_pos], &url[at_pos..]);
        }
    }
    url.to_string()
}
