//! Engine supervision.
//!
//! Owns the shutdown broadcast and the handles of the spawned convergence
//! loops. Loops run concurrently and independently; a single shutdown signal
//! propagates to all of them, and each observes it within one timer tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::errors::ReconcileResult;
use crate::services::{DatasourceLoop, ScrapeConfigLoop};

/// Supervises the long-running convergence loops.
pub struct Engine {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<(&'static str, JoinHandle<ReconcileResult<()>>)>,
}

impl Engine {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Spawn the scrape-config convergence loop.
    pub fn spawn_scrape_loop(&mut self, scrape_loop: Arc<ScrapeConfigLoop>) {
        let shutdown = self.shutdown_tx.subscribe();
        self.handles.push((
            "scrape-config",
            tokio::spawn(async move { scrape_loop.run(shutdown).await }),
        ));
    }

    /// Spawn the datasource convergence loop.
    pub fn spawn_datasource_loop(&mut self, datasource_loop: Arc<DatasourceLoop>) {
        let shutdown = self.shutdown_tx.subscribe();
        self.handles.push((
            "datasources",
            tokio::spawn(async move { datasource_loop.run(shutdown).await }),
        ));
    }

    /// Broadcast shutdown and wait for every loop to finish.
    pub async fn shutdown(self, timeout: Duration) {
        info!("shutting down convergence loops");
        let _ = self.shutdown_tx.send(());
        for (name, handle) in self.handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(Ok(()))) => info!(loop_name = name, "loop stopped"),
                Ok(Ok(Err(err))) => error!(loop_name = name, error = %err, "loop stopped with error"),
                Ok(Err(join_err)) => error!(loop_name = name, error = %join_err, "loop panicked"),
                Err(_) => warn!(loop_name = name, "loop shutdown timeout"),
            }
        }
    }

    /// Number of running loops.
    pub fn loop_count(&self) -> usize {
        self.handles.len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
