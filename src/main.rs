//! Affiliate revenue engine entry point.
//!
//! Loads configuration, initialises structured logging and runs the
//! collect → optimise → record cycle once, or on a fixed interval
//! until Ctrl+C.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};

use affiliate_engine::config::AppConfig;
use affiliate_engine::engine::RevenueEngine;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("AFFILIATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    info!(
        agent_name = %cfg.agent.name,
        networks = cfg.agent.networks.len(),
        poll_interval_secs = cfg.agent.poll_interval_secs,
        timeout_ms = cfg.collector.timeout_ms,
        proxies = cfg.collector.proxies.len(),
        cashflow = cfg.cashflow.enabled,
        "Affiliate engine starting up"
    );

    let engine = RevenueEngine::from_config(&cfg)?;

    if cfg.agent.poll_interval_secs == 0 {
        if let Err(e) = engine.run_cycle(&cfg.agent.networks).await {
            error!(error = format!("{e:#}"), "Critical error");
            return Err(e);
        }
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.agent.poll_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.agent.poll_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = engine.run_cycle(&cfg.agent.networks).await {
                    error!(error = format!("{e:#}"), "Cycle failed, continuing to next");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("Affiliate engine shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("affiliate_engine=info"));

    let json_logging = std::env::var("AFFILIATE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
