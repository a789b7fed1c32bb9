//! Port traits for external collaborators.
//!
//! The reconcilers depend only on these seams; production adapters live in
//! `infrastructure`, tests substitute in-memory implementations.

pub mod dashboard;
pub mod deployment;
pub mod platform;
pub mod reload;

pub use dashboard::{DashboardApi, DashboardError};
pub use deployment::{DeployError, DeploymentSink};
pub use platform::{PlatformClient, PlatformError};
pub use reload::{ReloadError, ReloadNotifier};
