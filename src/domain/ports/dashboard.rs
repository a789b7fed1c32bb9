//! Port trait for the dashboard tool's HTTP API.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::Datasource;

/// Errors from the dashboard tool's API.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dashboard API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("cannot update datasource {name}: no remote id")]
    MissingId { name: String },
}

/// Datasource operations on the dashboard tool.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_datasources(&self) -> Result<Vec<Datasource>, DashboardError>;

    async fn create_datasource(
        &self,
        datasource: &Datasource,
    ) -> Result<Datasource, DashboardError>;

    /// Update an existing datasource in place; `datasource.id` must be set.
    async fn update_datasource(
        &self,
        datasource: &Datasource,
    ) -> Result<Datasource, DashboardError>;
}
