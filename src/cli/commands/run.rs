//! `vigil run` - all convergence loops under one supervisor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::Engine;
use crate::cli::wiring;
use crate::domain::models::EngineConfig;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(config: EngineConfig) -> Result<()> {
    let mut engine = Engine::new();
    engine.spawn_scrape_loop(Arc::new(wiring::scrape_loop(&config)?));
    engine.spawn_datasource_loop(Arc::new(wiring::datasource_loop(&config)?));
    info!(loops = engine.loop_count(), "engine started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    engine.shutdown(SHUTDOWN_TIMEOUT).await;
    Ok(())
}
