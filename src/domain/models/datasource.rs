//! Dashboard datasource descriptors.

use serde::{Deserialize, Serialize};

use crate::domain::models::Binding;

/// A dashboard datasource, matched to its remote counterpart by name.
///
/// Field names follow the dashboard tool's HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    /// Remote numeric id. `None` for descriptors that have not been created
    /// remotely yet; preserved on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub org_id: u64,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Access mode; the dashboard tool proxies queries for us.
    pub access: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub basic_auth: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Default database queried when a panel names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

impl Datasource {
    /// Derive a time-series backend datasource from a binding's credentials.
    ///
    /// Credential keys follow the platform's binding contract: `uri`,
    /// `username`, `password`.
    pub fn from_influx_binding(binding: &Binding, org_id: u64) -> Self {
        let username = binding.credential("username").map(str::to_string);
        let password = binding.credential("password").map(str::to_string);
        Self {
            id: None,
            org_id,
            name: binding.name.clone(),
            kind: "influxdb".to_string(),
            access: "proxy".to_string(),
            url: binding.credential("uri").unwrap_or_default().to_string(),
            basic_auth: true,
            basic_auth_user: username.clone(),
            basic_auth_password: password.clone(),
            user: username,
            password,
            database: Some("defaultdb".to_string()),
            is_default: false,
        }
    }

    /// The synthetic datasource for the locally co-deployed metrics
    /// collector, marked as the default.
    pub fn collector_default(url: impl Into<String>, org_id: u64) -> Self {
        Self {
            id: None,
            org_id,
            name: "prometheus-0".to_string(),
            kind: "prometheus".to_string(),
            access: "proxy".to_string(),
            url: url.into(),
            basic_auth: false,
            basic_auth_user: None,
            basic_auth_password: None,
            user: None,
            password: None,
            database: None,
            is_default: true,
        }
    }
}
