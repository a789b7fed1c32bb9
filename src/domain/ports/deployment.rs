//! Port trait for the deployment sink.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::Manifest;

/// Errors from the deployment mechanism.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("manifest serialization failed: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("`{command}` exited with {code:?}")]
    CommandFailed { command: String, code: Option<i32> },
}

/// Accepts a declarative application manifest and performs an idempotent
/// deploy-or-update. Treated as opaque and atomic by the engine.
#[async_trait]
pub trait DeploymentSink: Send + Sync {
    async fn deploy(&self, manifest: &Manifest) -> Result<(), DeployError>;

    /// Allow container-network traffic from one deployed application to
    /// another on a port.
    async fn add_network_policy(
        &self,
        source_app: &str,
        destination_app: &str,
        port: u16,
    ) -> Result<(), DeployError>;
}
