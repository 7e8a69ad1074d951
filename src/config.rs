//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section carries defaults, so an empty file is a valid
//! configuration that polls nothing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

/// Default per-request timeout, applied to every outbound call.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub cashflow: CashflowConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Seconds between cycles. Zero runs a single cycle and exits.
    #[serde(default)]
    pub poll_interval_secs: u64,
    /// Affiliate networks polled every cycle.
    #[serde(default)]
    pub networks: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            poll_interval_secs: 0,
            networks: Vec::new(),
        }
    }
}

fn default_agent_name() -> String {
    "affiliate-engine".to_string()
}

/// How a proxy is picked from the pool for each request.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyRotation {
    #[default]
    RoundRobin,
    /// Always the first proxy in the pool.
    First,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Appended to each source to build the request URL, e.g. `/api/stats`.
    #[serde(default)]
    pub endpoint_path: Option<String>,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub proxy_rotation: ProxyRotation,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

impl CollectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            endpoint_path: None,
            proxies: Vec::new(),
            proxy_rotation: ProxyRotation::default(),
            headers: default_headers(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

#[derive(Debug, Deserialize, Clone)]
pub struct CashflowConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_gateways")]
    pub gateways: Vec<String>,
    #[serde(default = "default_cashflow_path")]
    pub endpoint_path: String,
}

impl Default for CashflowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gateways: default_gateways(),
            endpoint_path: default_cashflow_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_gateways() -> Vec<String> {
    vec!["api1".to_string(), "api2".to_string()]
}

fn default_cashflow_path() -> String {
    "/cashflow".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptimizerConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_min_bid")]
    pub min_bid_multiplier: f64,
    #[serde(default = "default_max_bid")]
    pub max_bid_multiplier: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            min_bid_multiplier: default_min_bid(),
            max_bid_multiplier: default_max_bid(),
        }
    }
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_min_bid() -> f64 {
    0.5
}

fn default_max_bid() -> f64 {
    2.0
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.collector.timeout_ms == 0 {
            anyhow::bail!("collector.timeout_ms must be greater than zero");
        }
        if config.optimizer.min_bid_multiplier > config.optimizer.max_bid_multiplier {
            anyhow::bail!(
                "optimizer.min_bid_multiplier ({}) exceeds max_bid_multiplier ({})",
                config.optimizer.min_bid_multiplier,
                config.optimizer.max_bid_multiplier
            );
        }
        Ok(config)
    }
}
