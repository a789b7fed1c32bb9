//! Error taxonomy for the reconciliation engine.
//!
//! Errors split into three classes that the loops treat differently:
//!
//! - configuration errors (missing offering/plan, duplicate instances, bad
//!   base config): the next cycle's inputs cannot change without external
//!   correction, so they are surfaced immediately;
//! - transient errors (platform/dashboard API failures, IO failures): logged
//!   at the loop boundary and retried after a fixed back-off;
//! - cancellation: always wins over any pending retry or poll and is never
//!   treated as an application error.

use thiserror::Error;

use crate::domain::ports::{DashboardError, DeployError, PlatformError, ReloadError};

/// Errors produced by the reconcilers and convergence loops.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("service offering not found: {0}")]
    OfferingNotFound(String),

    #[error("service plan not found: {0}")]
    PlanNotFound(String),

    #[error("expected at most one resource instance named {name}, found {count}")]
    DuplicateInstance { name: String, count: usize },

    #[error("base scrape config {path}: {reason}")]
    BaseConfig { path: String, reason: String },

    #[error("rendered scrape config is empty")]
    EmptyRendered,

    #[error("platform API error: {0}")]
    Platform(#[from] PlatformError),

    #[error("dashboard API error: {0}")]
    Dashboard(#[from] DashboardError),

    #[error("deployment error: {0}")]
    Deploy(#[from] DeployError),

    #[error("reload notification failed: {0}")]
    Reload(#[from] ReloadError),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("canceled")]
    Canceled,
}

impl ReconcileError {
    /// Whether this error is a configuration error that retrying cannot fix.
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::OfferingNotFound(_)
                | Self::PlanNotFound(_)
                | Self::DuplicateInstance { .. }
                | Self::BaseConfig { .. }
                | Self::EmptyRendered
        )
    }

    /// Whether this error is a cancellation outcome.
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
