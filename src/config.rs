use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_user_port")]
    pub user_port: u16,
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Default filter directive, used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional file that receives a copy of every log line
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_user_port() -> u16 {
    8000
}

fn default_admin_port() -> u16 {
    8001
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            user_port: default_user_port(),
            admin_port: default_admin_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl ServerConfig {
    pub fn user_addr(&self) -> String {
        format!("{}:{}", self.host, self.user_port)
    }

    pub fn admin_addr(&self) -> String {
        format!("{}:{}", self.host, self.admin_port)
    }
}

impl LogConfig {
    /// EnvFilter directive used when RUST_LOG is not set
    pub fn filter_directive(&self) -> String {
        format!("{},relaybot=debug", self.level)
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        if self.server.user_port == self.server.admin_port {
            bail!(
                "server.user_port and server.admin_port must differ (both are {})",
                self.server.user_port
            );
        }
        Ok(())
    }
}
