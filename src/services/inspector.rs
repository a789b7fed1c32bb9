//! State inspection: lifecycle states and reachable addresses.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::models::{LastOperationState, RouteEndpoint, DEFAULT_SCRAPE_PORT};
use crate::domain::ports::{PlatformClient, PlatformError};

/// Resolves a resource's current lifecycle state and, for network-addressable
/// workloads, the externally reachable addresses derived from route and
/// binding metadata.
#[derive(Clone)]
pub struct StateInspector {
    platform: Arc<dyn PlatformClient>,
}

impl StateInspector {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }

    /// Current lifecycle state of a resource instance.
    pub async fn instance_state(&self, guid: Uuid) -> Result<LastOperationState, PlatformError> {
        Ok(self.platform.get_instance(guid).await?.state)
    }

    /// All resolved route endpoints for a workload.
    ///
    /// Each mapped route is resolved to `host.domain` with the domain's
    /// internality flag and one endpoint per destination. A route whose
    /// destination metadata carries no port falls back to the default scrape
    /// port; a route with no destination metadata at all yields a single
    /// web-role endpoint on that default port.
    pub async fn workload_endpoints(
        &self,
        app_guid: Uuid,
    ) -> Result<Vec<RouteEndpoint>, PlatformError> {
        let mut endpoints = Vec::new();
        for mapping in self.platform.list_route_mappings(app_guid).await? {
            let route = self.platform.get_route(mapping.route_guid).await?;
            let domain = self.platform.get_domain(route.domain_guid).await?;
            let address = format!("{}.{}", route.host, domain.name);

            let destinations = self.platform.route_destinations(route.guid).await?;
            if destinations.is_empty() {
                endpoints.push(RouteEndpoint {
                    address,
                    port: DEFAULT_SCRAPE_PORT,
                    internal: domain.internal,
                    process_role: "web".to_string(),
                });
                continue;
            }
            for destination in destinations {
                endpoints.push(RouteEndpoint {
                    address: address.clone(),
                    port: destination.port.unwrap_or(DEFAULT_SCRAPE_PORT),
                    internal: domain.internal,
                    process_role: destination.process_role,
                });
            }
        }
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::models::RouteDestination;
    use crate::services::test_support::FakePlatform;

    use super::*;

    #[tokio::test]
    async fn resolves_address_port_and_internality() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        let app = platform.add_bound_workload(
            instance,
            "app",
            "app",
            "apps.internal",
            true,
            vec![RouteDestination {
                port: Some(9090),
                process_role: "web".into(),
            }],
        );

        let endpoints = StateInspector::new(platform)
            .workload_endpoints(app)
            .await
            .unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].address, "app.apps.internal");
        assert_eq!(endpoints[0].port, 9090);
        assert!(endpoints[0].internal);
        assert_eq!(endpoints[0].process_role, "web");
    }

    #[tokio::test]
    async fn missing_port_metadata_falls_back_to_default() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        let app = platform.add_bound_workload(
            instance,
            "app",
            "app",
            "apps.internal",
            true,
            vec![RouteDestination {
                port: None,
                process_role: "web".into(),
            }],
        );

        let endpoints = StateInspector::new(platform)
            .workload_endpoints(app)
            .await
            .unwrap();
        assert_eq!(endpoints[0].port, DEFAULT_SCRAPE_PORT);
    }

    #[tokio::test]
    async fn no_destination_metadata_yields_default_web_endpoint() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        let app =
            platform.add_bound_workload(instance, "app", "app", "apps.internal", true, vec![]);

        let endpoints = StateInspector::new(platform)
            .workload_endpoints(app)
            .await
            .unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].port, DEFAULT_SCRAPE_PORT);
        assert_eq!(endpoints[0].process_role, "web");
    }
}
