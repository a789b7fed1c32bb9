//! Vigil - Observability Stack Reconciler
//!
//! Vigil keeps a platform-hosted observability stack (metrics collector,
//! dashboard tool, time-series backend) converged with externally supplied
//! desired state. It watches the platform's bindings and routes, rewrites the
//! collector's scrape configuration, and synchronizes dashboard datasources,
//! all without manual intervention.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Data model and port traits for collaborators
//! - **Service Layer** (`services`): The reconciliation and convergence logic
//! - **Application Layer** (`application`): Engine supervision and provisioning
//! - **Infrastructure Layer** (`infrastructure`): Platform, dashboard, and
//!   reload adapters
//! - **CLI Layer** (`cli`): Command-line interface

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Engine, Provisioner};
pub use domain::errors::{ReconcileError, ReconcileResult};
pub use domain::models::{
    Binding, Datasource, EngineConfig, LastOperationState, Manifest, ResourceInstance,
    ResourceRequest, RouteEndpoint, ScrapeDocument, ScrapeJob, Workload,
};
pub use domain::ports::{
    DashboardApi, DeploymentSink, PlatformClient, ReloadNotifier,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ConvergeOutcome, DatasourceLoop, ResourceReconciler, ScrapeConfigLoop, ScrapeDiscovery,
    StateInspector,
};
