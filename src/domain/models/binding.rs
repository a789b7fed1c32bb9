//! Bindings, workloads, and route resolution types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A credential-bearing link between a resource instance and a workload.
///
/// Read-only from the engine's perspective; source of truth for both
/// scrape-target and datasource derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub guid: Uuid,
    /// GUID of the owning resource instance.
    pub resource_guid: Uuid,
    /// GUID of the bound workload.
    pub app_guid: Uuid,
    /// Service offering label of the owning resource, e.g. `influxdb`.
    /// Used to recognize datasource-worthy bindings.
    pub offering: String,
    /// Binding name; datasources derived from this binding reuse it.
    pub name: String,
    /// Opaque credential map handed out by the platform.
    pub credentials: Map<String, Value>,
}

impl Binding {
    /// Look up a string credential by key.
    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).and_then(Value::as_str)
    }
}

/// An application workload deployed on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub guid: Uuid,
    pub name: String,
}

/// A mapping between a workload and a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMapping {
    pub route_guid: Uuid,
}

/// A network route as tracked by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub guid: Uuid,
    pub host: String,
    pub domain_guid: Uuid,
}

/// A shared DNS domain. Internal domains are reachable only within the
/// platform's private network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub guid: Uuid,
    pub name: String,
    pub internal: bool,
}

/// One destination of a route: the process behind it and, when the platform
/// exposes it, the port that process listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDestination {
    pub port: Option<u16>,
    /// Process role of the destination, e.g. `web` or `worker`.
    pub process_role: String,
}

/// A fully resolved, externally reachable address for a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEndpoint {
    /// DNS name, `host.domain`.
    pub address: String,
    pub port: u16,
    /// Whether the route's domain is internal to the platform network.
    pub internal: bool,
    /// Process role behind this endpoint.
    pub process_role: String,
}
