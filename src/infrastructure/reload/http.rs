//! Reload notification via the collector's HTTP lifecycle endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::domain::ports::{ReloadError, ReloadNotifier};

/// POSTs to the collector's reload endpoint.
///
/// For collectors running with `--web.enable-lifecycle`, reachable over the
/// network rather than sharing a container with the loop.
pub struct HttpReloadNotifier {
    http: Client,
    endpoint: String,
}

impl HttpReloadNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReloadNotifier for HttpReloadNotifier {
    async fn notify(&self) -> Result<(), ReloadError> {
        debug!(endpoint = %self.endpoint, "requesting config reload");
        let response = self
            .http
            .post(&self.endpoint)
            .send()
            .await
            .map_err(|err| ReloadError::Endpoint {
                status: err.status().map_or(0, |s| s.as_u16()),
            })?;
        if !response.status().is_success() {
            return Err(ReloadError::Endpoint {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
