//! `vigil scrape-loop` - the collector sidecar process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::Engine;
use crate::cli::wiring;
use crate::domain::models::EngineConfig;

pub async fn execute(config: EngineConfig) -> Result<()> {
    let mut engine = Engine::new();
    engine.spawn_scrape_loop(Arc::new(wiring::scrape_loop(&config)?));
    info!(
        target = %config.collector.target_config_path,
        "scrape-config loop started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    engine.shutdown(Duration::from_secs(10)).await;
    Ok(())
}
