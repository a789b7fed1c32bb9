//! Port trait for the platform's resource APIs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::{
    Binding, Domain, OfferingRef, PlanRef, ResourceInstance, Route, RouteDestination,
    RouteMapping, Workload,
};

/// Errors from the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{kind} {guid} not found")]
    NotFound { kind: &'static str, guid: Uuid },
}

/// Authenticated handle to the platform's resource APIs.
///
/// Owned by the process and shared read-only by all reconcilers, so
/// implementations must be safe for concurrent use.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// List resource instances in a space filtered by name.
    async fn list_instances(
        &self,
        space_guid: Uuid,
        name: &str,
    ) -> Result<Vec<ResourceInstance>, PlatformError>;

    /// Fetch one resource instance, including its lifecycle state.
    async fn get_instance(&self, guid: Uuid) -> Result<ResourceInstance, PlatformError>;

    /// Create a resource instance from a plan.
    async fn create_instance(
        &self,
        space_guid: Uuid,
        plan_guid: Uuid,
        name: &str,
    ) -> Result<ResourceInstance, PlatformError>;

    /// Find a service offering by its catalog label.
    async fn find_offering(&self, label: &str) -> Result<Option<OfferingRef>, PlatformError>;

    /// List the plans available under an offering.
    async fn list_plans(&self, offering_guid: Uuid) -> Result<Vec<PlanRef>, PlatformError>;

    /// List bindings owned by a resource instance. Each binding carries the
    /// owning resource's offering label and credential map.
    async fn list_bindings(&self, instance_guid: Uuid) -> Result<Vec<Binding>, PlatformError>;

    /// Fetch a workload by GUID.
    async fn get_workload(&self, guid: Uuid) -> Result<Workload, PlatformError>;

    /// List route mappings for a workload.
    async fn list_route_mappings(
        &self,
        app_guid: Uuid,
    ) -> Result<Vec<RouteMapping>, PlatformError>;

    /// Fetch a route by GUID.
    async fn get_route(&self, guid: Uuid) -> Result<Route, PlatformError>;

    /// Fetch a shared domain by GUID.
    async fn get_domain(&self, guid: Uuid) -> Result<Domain, PlatformError>;

    /// Best-effort extension call: per-destination port and process role,
    /// which the standard route-mapping model does not expose.
    async fn route_destinations(
        &self,
        route_guid: Uuid,
    ) -> Result<Vec<RouteDestination>, PlatformError>;
}
