//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.gowon/module2.json`), then
//! broker settings can be overridden from the environment (`GOWON_BROKER_HOST`,
//! `GOWON_BROKER_PORT`) and finally from command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_CONFIG_PATH: &str = "GOWON_MODULE2_CONFIG";
pub const ENV_BROKER_HOST: &str = "GOWON_BROKER_HOST";
pub const ENV_BROKER_PORT: &str = "GOWON_BROKER_PORT";

const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Top-level module config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// MQTT broker connection.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Input and output topics.
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Module identity used in replies.
    #[serde(default)]
    pub module: ModuleConfig,

    /// Extra fixed-reply triggers, evaluated after the built-in ones.
    #[serde(default)]
    pub responders: RespondersConfig,
}

/// Broker address and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    /// Broker host (default "localhost"). Overridden by GOWON_BROKER_HOST.
    #[serde(default = "default_broker_host")]
    pub host: String,

    /// Broker port (default 1883). Overridden by GOWON_BROKER_PORT.
    #[serde(default = "default_broker_port")]
    pub port: u16,

    /// MQTT client id (default "gowon-module2").
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Pause after a connection error before polling (and so reconnecting) again.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "gowon-module2".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicsConfig {
    /// Topic the gateway publishes channel messages to (default "/gowon/input").
    #[serde(default = "default_input_topic")]
    pub input: String,

    /// Topic replies are published to (default "/gowon/output").
    #[serde(default = "default_output_topic")]
    pub output: String,
}

fn default_input_topic() -> String {
    "/gowon/input".to_string()
}

fn default_output_topic() -> String {
    "/gowon/output".to_string()
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            input: default_input_topic(),
            output: default_output_topic(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// Value of the `module` field in replies (default "module2").
    #[serde(default = "default_module_name")]
    pub name: String,
}

fn default_module_name() -> String {
    crate::dispatch::DEFAULT_MODULE_NAME.to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: default_module_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondersConfig {
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

/// A fixed reply for a phrase (matched case-insensitively anywhere in the message).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    pub phrase: String,
    pub response: String,
}

impl Config {
    /// Apply GOWON_BROKER_HOST / GOWON_BROKER_PORT as read through `lookup`
    /// (usually `std::env::var`). Blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        if let Some(host) = non_empty(ENV_BROKER_HOST) {
            self.broker.host = host;
        }
        if let Some(port) = non_empty(ENV_BROKER_PORT) {
            self.broker.port = port
                .parse()
                .with_context(|| format!("{} must be a port number, got {:?}", ENV_BROKER_PORT, port))?;
        }
        Ok(())
    }

    /// Check the config is usable before connecting.
    pub fn validate(&self) -> Result<()> {
        let host = self.broker.host.trim();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            anyhow::bail!("broker.host must be a host name, got {:?}", self.broker.host);
        }
        if self.broker.port == 0 {
            anyhow::bail!("broker.port must be between 1 and 65535");
        }
        if self.broker.client_id.trim().is_empty() {
            anyhow::bail!("broker.clientId must not be empty");
        }
        if self.broker.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            anyhow::bail!(
                "broker.keepAliveSecs must be at least {}, got {}",
                MIN_KEEP_ALIVE_SECS,
                self.broker.keep_alive_secs
            );
        }
        if self.topics.input.is_empty() {
            anyhow::bail!("topics.input must not be empty");
        }
        if self.topics.output.is_empty() {
            anyhow::bail!("topics.output must not be empty");
        }
        if self.topics.output.contains(|ch: char| ch == '+' || ch == '#') {
            anyhow::bail!(
                "topics.output must not contain wildcards, got {:?}",
                self.topics.output
            );
        }
        if self.topics.input == self.topics.output {
            anyhow::bail!("topics.input and topics.output must differ");
        }
        if self.module.name.trim().is_empty() {
            anyhow::bail!("module.name must not be empty");
        }
        if let Some(i) = self
            .responders
            .triggers
            .iter()
            .position(|t| t.phrase.trim().is_empty())
        {
            anyhow::bail!("responders.triggers[{}].phrase must not be empty", i);
        }
        Ok(())
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".gowon").join("module2.json"))
                .unwrap_or_else(|| PathBuf::from("module2.json"))
        })
}

/// Load config from `path` (or the default path). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
