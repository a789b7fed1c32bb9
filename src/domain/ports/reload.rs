//! Port trait for the collector reload capability.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from reload delivery.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to signal pid {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("reload endpoint returned {status}")]
    Endpoint { status: u16 },
}

/// Tells the running collector to pick up its rewritten configuration.
///
/// The convergence loop depends only on this capability; implementations
/// differ per target platform (OS signal, HTTP reload endpoint, supervisor
/// API).
#[async_trait]
pub trait ReloadNotifier: Send + Sync {
    async fn notify(&self) -> Result<(), ReloadError>;
}
