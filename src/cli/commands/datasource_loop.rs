//! `vigil datasource-loop` - the dashboard reloader process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::Engine;
use crate::cli::wiring;
use crate::domain::models::EngineConfig;

pub async fn execute(config: EngineConfig) -> Result<()> {
    let mut engine = Engine::new();
    engine.spawn_datasource_loop(Arc::new(wiring::datasource_loop(&config)?));
    info!(
        dashboard = %config.dashboard.api_endpoint,
        "datasource loop started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    engine.shutdown(Duration::from_secs(10)).await;
    Ok(())
}
