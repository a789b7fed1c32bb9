//! `DashboardApi` implementation over the dashboard tool's HTTP API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::domain::models::{Datasource, DashboardConfig};
use crate::domain::ports::{DashboardApi, DashboardError};

/// HTTP client for the dashboard tool's datasource API, using basic auth.
pub struct HttpDashboardApi {
    http: Client,
    api_endpoint: String,
    username: String,
    password: String,
}

/// Mutation responses wrap the stored datasource.
#[derive(Deserialize)]
struct MutationResponse {
    datasource: Datasource,
}

impl HttpDashboardApi {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_endpoint)
    }

    async fn checked(response: Response) -> Result<Response, DashboardError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn list_datasources(&self) -> Result<Vec<Datasource>, DashboardError> {
        let response = self
            .http
            .get(self.url("/api/datasources"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn create_datasource(
        &self,
        datasource: &Datasource,
    ) -> Result<Datasource, DashboardError> {
        let response = self
            .http
            .post(self.url("/api/datasources"))
            .basic_auth(&self.username, Some(&self.password))
            .json(datasource)
            .send()
            .await?;
        let body: MutationResponse = Self::checked(response).await?.json().await?;
        Ok(body.datasource)
    }

    async fn update_datasource(
        &self,
        datasource: &Datasource,
    ) -> Result<Datasource, DashboardError> {
        let id = datasource.id.ok_or_else(|| DashboardError::MissingId {
            name: datasource.name.clone(),
        })?;
        let response = self
            .http
            .put(self.url(&format!("/api/datasources/{id}")))
            .basic_auth(&self.username, Some(&self.password))
            .json(datasource)
            .send()
            .await?;
        let body: MutationResponse = Self::checked(response).await?.json().await?;
        Ok(body.datasource)
    }
}
