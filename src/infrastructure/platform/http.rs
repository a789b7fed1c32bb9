//! `PlatformClient` implementation over the platform's v2/v3 resource APIs.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::models::{
    Binding, Domain, LastOperationState, OfferingRef, PlanRef, ResourceInstance, Route,
    RouteDestination, RouteMapping, Workload,
};
use crate::domain::ports::{PlatformClient, PlatformError};
use crate::infrastructure::platform::Session;

/// HTTP implementation of the platform's resource APIs.
pub struct HttpPlatformClient {
    session: Session,
}

// v2 resource envelope

#[derive(Deserialize)]
struct ListResponse<T> {
    resources: Vec<Resource<T>>,
}

#[derive(Deserialize)]
struct Resource<T> {
    metadata: Metadata,
    entity: T,
}

#[derive(Deserialize)]
struct Metadata {
    guid: Uuid,
}

#[derive(Deserialize)]
struct InstanceEntity {
    name: String,
    #[serde(default)]
    service_guid: Option<Uuid>,
    #[serde(default)]
    last_operation: Option<LastOperation>,
}

#[derive(Deserialize)]
struct LastOperation {
    state: LastOperationState,
}

#[derive(Deserialize)]
struct ServiceEntity {
    label: String,
}

#[derive(Deserialize)]
struct PlanEntity {
    name: String,
}

#[derive(Deserialize)]
struct BindingEntity {
    app_guid: Uuid,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    credentials: Map<String, Value>,
}

#[derive(Deserialize)]
struct AppEntity {
    name: String,
}

#[derive(Deserialize)]
struct RouteMappingEntity {
    route_guid: Uuid,
}

#[derive(Deserialize)]
struct RouteEntity {
    host: String,
    domain_guid: Uuid,
}

#[derive(Deserialize)]
struct DomainEntity {
    name: String,
    #[serde(default)]
    internal: bool,
}

// v3 destination extension

#[derive(Deserialize)]
struct DestinationsResponse {
    destinations: Vec<DestinationResource>,
}

#[derive(Deserialize)]
struct DestinationResource {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    app: Option<DestinationApp>,
}

#[derive(Deserialize)]
struct DestinationApp {
    #[serde(default)]
    process: Option<DestinationProcess>,
}

#[derive(Deserialize)]
struct DestinationProcess {
    #[serde(rename = "type")]
    kind: String,
}

impl HttpPlatformClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// GET with bearer auth; re-authenticates once on a 401.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let mut refreshed = false;
        loop {
            let token = self.session.bearer().await?;
            let response = self
                .session
                .http()
                .get(format!("{}{path}", self.session.api_endpoint()))
                .bearer_auth(token)
                .send()
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                self.session.invalidate().await;
                refreshed = true;
                continue;
            }
            return Self::decode(response).await;
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, PlatformError> {
        let token = self.session.bearer().await?;
        let response = self
            .session
            .http()
            .post(format!("{}{path}", self.session.api_endpoint()))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    fn instance_from(resource: Resource<InstanceEntity>) -> ResourceInstance {
        ResourceInstance {
            guid: resource.metadata.guid,
            name: resource.entity.name,
            // instances created synchronously carry no last operation
            state: resource
                .entity
                .last_operation
                .map_or(LastOperationState::Succeeded, |op| op.state),
        }
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn list_instances(
        &self,
        space_guid: Uuid,
        name: &str,
    ) -> Result<Vec<ResourceInstance>, PlatformError> {
        let list: ListResponse<InstanceEntity> = self
            .get_json(&format!(
                "/v2/service_instances?q=space_guid:{space_guid}&q=name:{name}"
            ))
            .await?;
        Ok(list.resources.into_iter().map(Self::instance_from).collect())
    }

    async fn get_instance(&self, guid: Uuid) -> Result<ResourceInstance, PlatformError> {
        let resource: Resource<InstanceEntity> =
            self.get_json(&format!("/v2/service_instances/{guid}")).await?;
        Ok(Self::instance_from(resource))
    }

    async fn create_instance(
        &self,
        space_guid: Uuid,
        plan_guid: Uuid,
        name: &str,
    ) -> Result<ResourceInstance, PlatformError> {
        let resource: Resource<InstanceEntity> = self
            .post_json(
                "/v2/service_instances?accepts_incomplete=true",
                &json!({
                    "name": name,
                    "space_guid": space_guid,
                    "service_plan_guid": plan_guid,
                }),
            )
            .await?;
        Ok(Self::instance_from(resource))
    }

    async fn find_offering(&self, label: &str) -> Result<Option<OfferingRef>, PlatformError> {
        let list: ListResponse<ServiceEntity> =
            self.get_json(&format!("/v2/services?q=label:{label}")).await?;
        Ok(list.resources.into_iter().next().map(|r| OfferingRef {
            guid: r.metadata.guid,
            label: r.entity.label,
        }))
    }

    async fn list_plans(&self, offering_guid: Uuid) -> Result<Vec<PlanRef>, PlatformError> {
        let list: ListResponse<PlanEntity> = self
            .get_json(&format!("/v2/service_plans?q=service_guid:{offering_guid}"))
            .await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| PlanRef {
                guid: r.metadata.guid,
                name: r.entity.name,
            })
            .collect())
    }

    async fn list_bindings(&self, instance_guid: Uuid) -> Result<Vec<Binding>, PlatformError> {
        let instance: Resource<InstanceEntity> = self
            .get_json(&format!("/v2/service_instances/{instance_guid}"))
            .await?;
        let offering = match instance.entity.service_guid {
            Some(service_guid) => {
                let service: Resource<ServiceEntity> =
                    self.get_json(&format!("/v2/services/{service_guid}")).await?;
                service.entity.label
            }
            None => String::new(),
        };
        let list: ListResponse<BindingEntity> = self
            .get_json(&format!(
                "/v2/service_bindings?q=service_instance_guid:{instance_guid}"
            ))
            .await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| Binding {
                guid: r.metadata.guid,
                resource_guid: instance_guid,
                app_guid: r.entity.app_guid,
                offering: offering.clone(),
                name: r.entity.name.unwrap_or_else(|| instance.entity.name.clone()),
                credentials: r.entity.credentials,
            })
            .collect())
    }

    async fn get_workload(&self, guid: Uuid) -> Result<Workload, PlatformError> {
        let resource: Resource<AppEntity> = self.get_json(&format!("/v2/apps/{guid}")).await?;
        Ok(Workload {
            guid: resource.metadata.guid,
            name: resource.entity.name,
        })
    }

    async fn list_route_mappings(
        &self,
        app_guid: Uuid,
    ) -> Result<Vec<RouteMapping>, PlatformError> {
        let list: ListResponse<RouteMappingEntity> = self
            .get_json(&format!("/v2/route_mappings?q=app_guid:{app_guid}"))
            .await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| RouteMapping {
                route_guid: r.entity.route_guid,
            })
            .collect())
    }

    async fn get_route(&self, guid: Uuid) -> Result<Route, PlatformError> {
        let resource: Resource<RouteEntity> =
            self.get_json(&format!("/v2/routes/{guid}")).await?;
        Ok(Route {
            guid: resource.metadata.guid,
            host: resource.entity.host,
            domain_guid: resource.entity.domain_guid,
        })
    }

    async fn get_domain(&self, guid: Uuid) -> Result<Domain, PlatformError> {
        let resource: Resource<DomainEntity> =
            self.get_json(&format!("/v2/shared_domains/{guid}")).await?;
        Ok(Domain {
            guid: resource.metadata.guid,
            name: resource.entity.name,
            internal: resource.entity.internal,
        })
    }

    async fn route_destinations(
        &self,
        route_guid: Uuid,
    ) -> Result<Vec<RouteDestination>, PlatformError> {
        // the standard route-mapping model does not expose ports or process
        // roles, so this goes straight to the newer destination API
        let response: DestinationsResponse = self
            .get_json(&format!("/v3/routes/{route_guid}/destinations"))
            .await?;
        Ok(response
            .destinations
            .into_iter()
            .map(|d| RouteDestination {
                port: d.port,
                process_role: d
                    .app
                    .and_then(|app| app.process)
                    .map_or_else(|| "web".to_string(), |process| process.kind),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::models::PlatformConfig;

    use super::*;

    fn session_for(server: &mockito::ServerGuard) -> Session {
        Session::new(&PlatformConfig {
            api_endpoint: server.url(),
            username: "user".into(),
            password: "pass".into(),
            ..PlatformConfig::default()
        })
        .unwrap()
    }

    fn mock_auth(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
        let info = server
            .mock("GET", "/v2/info")
            .with_status(200)
            .with_body(format!(
                "{{\"authorization_endpoint\": \"{}\"}}",
                server.url()
            ))
            .create();
        let token = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token": "test-token", "token_type": "bearer"}"#)
            .create();
        vec![info, token]
    }

    #[tokio::test]
    async fn lists_instances_with_lifecycle_state() {
        let mut server = mockito::Server::new_async().await;
        let _auth = mock_auth(&mut server);
        let guid = Uuid::new_v4();
        let _list = server
            .mock(
                "GET",
                format!("/v2/service_instances?q=space_guid:{guid}&q=name:influx").as_str(),
            )
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(
                r#"{"resources": [{
                    "metadata": {"guid": "10400cc3-9bf9-4d6d-ad16-46096febfff8"},
                    "entity": {"name": "influx", "last_operation": {"state": "in progress"}}
                }]}"#,
            )
            .create();

        let client = HttpPlatformClient::new(session_for(&server));
        let instances = client.list_instances(guid, "influx").await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].state, LastOperationState::InProgress);
        assert_eq!(instances[0].name, "influx");
    }

    #[tokio::test]
    async fn reauthenticates_exactly_once_on_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _info = server
            .mock("GET", "/v2/info")
            .with_status(200)
            .with_body(format!(
                "{{\"authorization_endpoint\": \"{}\"}}",
                server.url()
            ))
            .expect(2)
            .create();
        let token = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token": "test-token", "token_type": "bearer"}"#)
            .expect(2)
            .create();
        let guid = Uuid::new_v4();
        let unauthorized = server
            .mock("GET", format!("/v2/apps/{guid}").as_str())
            .with_status(401)
            .with_body("{}")
            .expect(2)
            .create();

        let client = HttpPlatformClient::new(session_for(&server));
        let err = client.get_workload(guid).await.unwrap_err();

        // one retry after a fresh token, then the failure surfaces
        assert!(matches!(err, PlatformError::Api { status: 401, .. }));
        token.assert_async().await;
        unauthorized.assert_async().await;
    }

    #[tokio::test]
    async fn parses_destination_ports_and_roles() {
        let mut server = mockito::Server::new_async().await;
        let _auth = mock_auth(&mut server);
        let guid = Uuid::new_v4();
        let _destinations = server
            .mock("GET", format!("/v3/routes/{guid}/destinations").as_str())
            .with_status(200)
            .with_body(
                r#"{"destinations": [
                    {"port": 9090, "app": {"process": {"type": "web"}}},
                    {"app": {"process": {"type": "worker"}}}
                ]}"#,
            )
            .create();

        let client = HttpPlatformClient::new(session_for(&server));
        let destinations = client.route_destinations(guid).await.unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0].port, Some(9090));
        assert_eq!(destinations[0].process_role, "web");
        assert_eq!(destinations[1].port, None);
        assert_eq!(destinations[1].process_role, "worker");
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _auth = mock_auth(&mut server);
        let guid = Uuid::new_v4();
        let _err = server
            .mock("GET", format!("/v2/routes/{guid}").as_str())
            .with_status(502)
            .with_body("bad gateway")
            .create();

        let client = HttpPlatformClient::new(session_for(&server));
        let err = client.get_route(guid).await.unwrap_err();
        assert!(matches!(err, PlatformError::Api { status: 502, .. }));
    }
}
