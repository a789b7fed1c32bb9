//! `vigil provision` - one-shot stack provisioning.

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::info;

use crate::cli::wiring;
use crate::domain::models::EngineConfig;

pub async fn execute(config: EngineConfig) -> Result<()> {
    let provisioner = wiring::provisioner(&config)?;

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    provisioner
        .provision(&mut shutdown_rx)
        .await
        .context("Provisioning failed")?;
    info!("observability stack provisioned");
    Ok(())
}
