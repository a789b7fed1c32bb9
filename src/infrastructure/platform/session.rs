//! Platform session bootstrap: endpoint targeting and token acquisition.
//!
//! Kept minimal, at the interface boundary: discover the authorization
//! endpoint from the platform API, obtain a bearer token with the password
//! grant, and re-authenticate on demand when a token expires.

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::models::PlatformConfig;
use crate::domain::ports::PlatformError;

/// An authenticated session against the platform API.
pub struct Session {
    http: Client,
    api_endpoint: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct InfoResponse {
    authorization_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Session {
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()?;
        Ok(Self {
            http,
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: RwLock::new(None),
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    /// Current bearer token, authenticating first if none is held.
    pub async fn bearer(&self) -> Result<String, PlatformError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await
    }

    /// Drop the held token so the next request re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn authenticate(&self) -> Result<String, PlatformError> {
        let info: InfoResponse = self
            .http
            .get(format!("{}/v2/info", self.api_endpoint))
            .send()
            .await?
            .error_for_status()
            .map_err(|err| PlatformError::Auth(err.to_string()))?
            .json()
            .await?;
        debug!(endpoint = %info.authorization_endpoint, "authenticating against platform");

        let response = self
            .http
            .post(format!("{}/oauth/token", info.authorization_endpoint))
            .basic_auth("cf", Some(""))
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;
        *self.token.write().await = Some(token.access_token.clone());
        Ok(token.access_token)
    }
}
