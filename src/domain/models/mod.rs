//! Domain models
//!
//! Pure data types shared across the reconcilers: platform resources and
//! bindings, the generated scrape-config document, dashboard datasources,
//! deployment manifests, and the engine configuration.

pub mod binding;
pub mod config;
pub mod datasource;
pub mod manifest;
pub mod resource;
pub mod scrape;

pub use binding::{Binding, Domain, Route, RouteDestination, RouteEndpoint, RouteMapping, Workload};
pub use config::{
    CollectorConfig, DashboardConfig, DatastoreConfig, EngineConfig, LoggingConfig,
    PlatformConfig, StackConfig,
};
pub use datasource::Datasource;
pub use manifest::{AppManifest, DockerConfig, Manifest, ManifestMetadata, ManifestRoute, Sidecar};
pub use resource::{
    LastOperationState, OfferingRef, PlanRef, ResourceInstance, ResourceRequest,
};
pub use scrape::{
    BasicAuthSettings, DnsSdTargets, GlobalSettings, RemoteReadBackend, RemoteWriteBackend,
    ScrapeDocument, ScrapeJob, DEFAULT_METRICS_PATH, DEFAULT_SCRAPE_INTERVAL, DEFAULT_SCRAPE_PORT,
};
