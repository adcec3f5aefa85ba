mod config;
mod flows;
mod gateway;
mod links;
mod polling;
mod router;
mod server;
mod update;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::flows::FlowContext;
use crate::gateway::TelegramGateway;
use crate::router::UpdateRouter;

const USAGE: &str = "Usage: file-relay-bot [--poll] [CONFIG_PATH]";

/// Command line: an optional config path and the `--poll` switch.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    poll: bool,
    config_path: Option<PathBuf>,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "--poll" => parsed.poll = true,
            flag if flag.starts_with('-') => {
                anyhow::bail!("Unknown option: {}\n{}", flag, USAGE)
            }
            path => {
                if parsed.config_path.is_some() {
                    anyhow::bail!("Unexpected argument: {}\n{}", path, USAGE);
                }
                parsed.config_path = Some(PathBuf::from(path));
            }
        }
    }
    Ok(parsed)
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.or_else(|| {
        let default = PathBuf::from("config.toml");
        default.exists().then_some(default)
    });

    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            info!("Loading configuration from environment");
            Config::from_env().context("Failed to load config from environment")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,file_relay_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config_path)?;

    info!("Configuration loaded successfully");
    info!("  Storage channel: {}", config.channels.storage);
    info!("  Gate channel: {}", config.channels.gate);
    info!("  Admins: {:?}", config.telegram.admin_ids);

    let gateway = Arc::new(TelegramGateway::new(
        &config.telegram.api_url,
        &config.telegram.bot_token,
    )?);
    let bot = gateway.bot();
    let ctx = FlowContext::new(&config, gateway)?;
    let router = Arc::new(UpdateRouter::new(ctx));

    if args.poll {
        info!("Bot is starting in polling mode...");
        polling::run(bot, router).await
    } else {
        info!("Bot is starting in webhook mode...");
        server::run(router, &config.server.listen).await
    }
}
