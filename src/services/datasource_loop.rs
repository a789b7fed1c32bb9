//! Datasource convergence loop for the dashboard tool.
//!
//! Same looping shape as the scrape-config loop but without file or signal
//! side effects: every cycle derives the desired datasources from active
//! bindings and upserts each one against the dashboard API. Upserts are not
//! disruptive, so there is no diff-skip. Datasources for bindings that
//! disappear are deliberately left in place; the desired pruning policy is
//! unspecified upstream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::errors::ReconcileResult;
use crate::domain::models::{Binding, Datasource};
use crate::domain::ports::{DashboardApi, PlatformClient};

/// Sleep after a failed cycle, superseding the normal interval once.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(30);

/// The convergence loop for dashboard datasources.
pub struct DatasourceLoop {
    platform: Arc<dyn PlatformClient>,
    dashboard: Arc<dyn DashboardApi>,
    /// Bindings of this instance become datasources. `None` means only the
    /// synthetic collector datasource is synchronized.
    datastore_instance_guid: Option<Uuid>,
    /// URL of the co-deployed collector; appended as the default datasource.
    collector_url: Option<String>,
    org_id: u64,
    interval: Duration,
    error_backoff: Duration,
}

impl DatasourceLoop {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        dashboard: Arc<dyn DashboardApi>,
        datastore_instance_guid: Option<Uuid>,
        org_id: u64,
    ) -> Self {
        Self {
            platform,
            dashboard,
            datastore_instance_guid,
            collector_url: None,
            org_id,
            interval: Duration::from_secs(60),
            error_backoff: ERROR_BACKOFF,
        }
    }

    pub fn with_collector_url(mut self, url: Option<String>) -> Self {
        self.collector_url = url;
        self
    }

    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[cfg(test)]
    pub const fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Run until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ReconcileResult<()> {
        loop {
            debug!(in_secs = self.interval.as_secs(), "next datasource convergence");
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                () = sleep(self.interval) => {
                    if let Err(err) = self.converge().await {
                        error!(error = %err, phase = "datasources", "convergence cycle failed");
                        tokio::select! {
                            _ = shutdown.recv() => return Ok(()),
                            () = sleep(self.error_backoff) => {}
                        }
                    }
                }
            }
        }
    }

    /// One derive-and-upsert cycle. Returns how many datasources were
    /// applied.
    pub async fn converge(&self) -> ReconcileResult<usize> {
        let bindings = match self.datastore_instance_guid {
            Some(guid) => self.platform.list_bindings(guid).await?,
            None => Vec::new(),
        };
        let desired = self.desired_datasources(&bindings);
        for datasource in &desired {
            self.upsert(datasource).await?;
        }
        Ok(desired.len())
    }

    /// Derive the desired datasource set from active bindings, appending the
    /// synthetic collector datasource when configured.
    fn desired_datasources(&self, bindings: &[Binding]) -> Vec<Datasource> {
        let mut desired = Vec::new();
        for binding in bindings {
            match binding.offering.as_str() {
                "influxdb" => {
                    desired.push(Datasource::from_influx_binding(binding, self.org_id));
                }
                other => {
                    debug!(offering = %other, binding = %binding.name, "ignoring binding of unrecognized offering");
                }
            }
        }
        if let Some(url) = &self.collector_url {
            desired.push(Datasource::collector_default(url.clone(), self.org_id));
        }
        desired
    }

    /// Find-by-name upsert: update in place preserving the remote id, or
    /// create when absent.
    async fn upsert(&self, desired: &Datasource) -> ReconcileResult<()> {
        let existing = self.dashboard.list_datasources().await?;
        if let Some(remote) = existing.iter().find(|ds| ds.name == desired.name) {
            let mut update = desired.clone();
            update.id = remote.id;
            info!(datasource = %desired.name, id = ?remote.id, "updating datasource");
            self.dashboard.update_datasource(&update).await?;
        } else {
            info!(datasource = %desired.name, "creating datasource");
            self.dashboard.create_datasource(desired).await?;
        }
        Ok(())
    }
}
