use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::gateway::ChatRef;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub channels: ChannelsConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Host part of share links, e.g. `https://t.me`.
    #[serde(default = "default_link_base")]
    pub link_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelsConfig {
    /// Private channel holding the relayed copies.
    pub storage: ChatRef,
    /// Channel a user must belong to before receiving files.
    pub gate: ChatRef,
    pub join_link: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid admin id {0:?}")]
pub struct AdminIdError(pub String);

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_link_base() -> String {
    "https://t.me".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        listen: default_listen(),
    }
}

/// Parse a comma-separated admin list such as `"111, 222"`.
/// Empty entries are skipped; anything non-numeric is rejected.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, AdminIdError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| AdminIdError(s.to_string())))
        .collect()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Missing environment variable {}", key))
        };

        let bot_token = required("BOT_TOKEN")?;
        let storage: ChatRef = required("STORAGE_CHANNEL")?.parse()?;
        let gate: ChatRef = required("F_CHANNEL")?.parse()?;
        let join_link = required("JOIN_LINK")?;
        let admin_ids = match lookup("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw).context("Failed to parse ADMIN_IDS")?,
            None => Vec::new(),
        };

        let config = Config {
            telegram: TelegramConfig {
                bot_token,
                admin_ids,
                api_url: lookup("TELEGRAM_API_URL").unwrap_or_else(default_api_url),
                link_base: lookup("LINK_BASE").unwrap_or_else(default_link_base),
            },
            channels: ChannelsConfig {
                storage,
                gate,
                join_link,
            },
            server: ServerConfig {
                listen: lookup("LISTEN_ADDR").unwrap_or_else(default_listen),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token must not be empty");
        }
        self.join_url()?;
        reqwest::Url::parse(&self.telegram.link_base)
            .with_context(|| format!("Invalid link base: {}", self.telegram.link_base))?;
        Ok(())
    }

    pub fn join_url(&self) -> Result<reqwest::Url> {
        reqwest::Url::parse(&self.channels.join_link)
            .with_context(|| format!("Invalid join link: {}", self.channels.join_link))
    }

    pub fn admin_set(&self) -> HashSet<i64> {
        self.telegram.admin_ids.iter().copied().collect()
    }
}
