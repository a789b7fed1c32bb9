//! Engine configuration model.
//!
//! Loaded hierarchically by `infrastructure::config::ConfigLoader`:
//! programmatic defaults, then `vigil.yaml`, then `VIGIL_*` environment
//! variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::scrape::{RemoteReadBackend, RemoteWriteBackend, ScrapeJob};

/// Main configuration structure for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Platform API access and targeting.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Metrics collector convergence loop.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Dashboard tool datasource loop.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Backing time-series resource to provision.
    #[serde(default)]
    pub datastore: DatastoreConfig,

    /// Names and images for the deployed observability stack.
    #[serde(default)]
    pub stack: StackConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform API endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlatformConfig {
    /// Platform API endpoint, e.g. `https://api.platform.example`.
    #[serde(default)]
    pub api_endpoint: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub org_name: String,

    #[serde(default)]
    pub space_name: String,

    /// GUID of the space resources are reconciled into.
    #[serde(default)]
    pub space_guid: Option<Uuid>,

    #[serde(default)]
    pub skip_ssl_validation: bool,

    /// Platform CLI executable used by the deployment sink.
    #[serde(default = "default_cli_binary")]
    pub cli_binary: String,
}

fn default_cli_binary() -> String {
    "cf".to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            org_name: String::new(),
            space_name: String::new(),
            space_guid: None,
            skip_ssl_validation: false,
            cli_binary: default_cli_binary(),
        }
    }
}

/// Scrape-config convergence loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectorConfig {
    /// GUID of the collector's resource instance; its bindings drive
    /// scrape-target discovery.
    #[serde(default)]
    pub instance_guid: Option<Uuid>,

    /// Static base configuration document merged into every build.
    #[serde(default = "default_base_config_path")]
    pub base_config_path: String,

    /// Where the generated document is written.
    #[serde(default = "default_target_config_path")]
    pub target_config_path: String,

    /// Executable name of the collector process to signal on reload.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Steady-state polling interval, seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Labels appended to the document's global external labels.
    #[serde(default)]
    pub external_labels: BTreeMap<String, String>,

    /// Statically configured extra scrape jobs.
    #[serde(default)]
    pub extra_scrape_configs: Vec<ScrapeJob>,

    /// Statically configured remote-read backends.
    #[serde(default)]
    pub remote_read: Vec<RemoteReadBackend>,

    /// Statically configured remote-write backends.
    #[serde(default)]
    pub remote_write: Vec<RemoteWriteBackend>,
}

fn default_base_config_path() -> String {
    "base-config.yml".to_string()
}

fn default_target_config_path() -> String {
    "config.yml".to_string()
}

fn default_process_name() -> String {
    "prometheus".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            instance_guid: None,
            base_config_path: default_base_config_path(),
            target_config_path: default_target_config_path(),
            process_name: default_process_name(),
            poll_interval_secs: default_poll_interval_secs(),
            external_labels: BTreeMap::new(),
            extra_scrape_configs: Vec::new(),
            remote_read: Vec::new(),
            remote_write: Vec::new(),
        }
    }
}

/// Dashboard datasource loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardConfig {
    /// Dashboard tool HTTP API endpoint, e.g. `http://dashboard.apps.internal:3000`.
    #[serde(default)]
    pub api_endpoint: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_org_id")]
    pub org_id: u64,

    /// Polling interval, seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// GUID of the backing datastore instance whose bindings become
    /// datasources. When unset, only the synthetic collector datasource is
    /// synchronized.
    #[serde(default)]
    pub datastore_instance_guid: Option<Uuid>,

    /// URL of the co-deployed collector; when set, a default datasource
    /// pointing at it is appended.
    #[serde(default)]
    pub collector_url: Option<String>,
}

const fn default_org_id() -> u64 {
    1
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            org_id: default_org_id(),
            poll_interval_secs: default_poll_interval_secs(),
            datastore_instance_guid: None,
            collector_url: None,
        }
    }
}

/// The backing time-series resource requested at provisioning time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatastoreConfig {
    #[serde(default = "default_datastore_offering")]
    pub offering: String,

    #[serde(default = "default_datastore_plan")]
    pub plan: String,

    #[serde(default = "default_datastore_instance_name")]
    pub instance_name: String,
}

fn default_datastore_offering() -> String {
    "influxdb".to_string()
}

fn default_datastore_plan() -> String {
    "tiny-1.x".to_string()
}

fn default_datastore_instance_name() -> String {
    "observability-datastore".to_string()
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            offering: default_datastore_offering(),
            plan: default_datastore_plan(),
            instance_name: default_datastore_instance_name(),
        }
    }
}

/// Names, routes, and images for the deployed observability stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StackConfig {
    #[serde(default = "default_collector_app")]
    pub collector_app: String,

    #[serde(default = "default_exporter_app")]
    pub exporter_app: String,

    #[serde(default = "default_dashboard_app")]
    pub dashboard_app: String,

    #[serde(default = "default_dashboard_reloader_app")]
    pub dashboard_reloader_app: String,

    /// Internal domain the stack's routes live on.
    #[serde(default = "default_internal_domain")]
    pub internal_domain: String,

    /// Buildpack for the collector application.
    #[serde(default = "default_collector_buildpack")]
    pub collector_buildpack: String,

    /// Container image for the dashboard application.
    #[serde(default = "default_dashboard_image")]
    pub dashboard_image: String,

    #[serde(default = "default_dashboard_admin_user")]
    pub dashboard_admin_user: String,

    #[serde(default = "default_dashboard_admin_password")]
    pub dashboard_admin_password: String,

    /// Port the dashboard image listens on.
    #[serde(default = "default_dashboard_port")]
    pub dashboard_port: u16,

    /// Directory holding the stack's application bits.
    #[serde(default = "default_apps_path")]
    pub apps_path: String,

    /// Owner label stamped onto every deployed application.
    #[serde(default = "default_owner_label")]
    pub owner_label: String,
}

fn default_collector_app() -> String {
    "vigil-prometheus".to_string()
}

fn default_exporter_app() -> String {
    "vigil-exporter".to_string()
}

fn default_dashboard_app() -> String {
    "vigil-grafana".to_string()
}

fn default_dashboard_reloader_app() -> String {
    "vigil-grafana-reloader".to_string()
}

fn default_internal_domain() -> String {
    "apps.internal".to_string()
}

fn default_collector_buildpack() -> String {
    "https://github.com/alphagov/prometheus-buildpack.git".to_string()
}

fn default_dashboard_image() -> String {
    "grafana/grafana:7.0.1".to_string()
}

fn default_dashboard_admin_user() -> String {
    "admin".to_string()
}

fn default_dashboard_admin_password() -> String {
    "password".to_string()
}

const fn default_dashboard_port() -> u16 {
    3000
}

fn default_apps_path() -> String {
    "apps".to_string()
}

fn default_owner_label() -> String {
    "vigil".to_string()
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            collector_app: default_collector_app(),
            exporter_app: default_exporter_app(),
            dashboard_app: default_dashboard_app(),
            dashboard_reloader_app: default_dashboard_reloader_app(),
            internal_domain: default_internal_domain(),
            collector_buildpack: default_collector_buildpack(),
            dashboard_image: default_dashboard_image(),
            dashboard_admin_user: default_dashboard_admin_user(),
            dashboard_admin_password: default_dashboard_admin_password(),
            dashboard_port: default_dashboard_port(),
            apps_path: default_apps_path(),
            owner_label: default_owner_label(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
