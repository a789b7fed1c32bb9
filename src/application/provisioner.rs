//! One-shot provisioning of the observability stack.
//!
//! Reconciles the backing time-series resource, then hands the stack's
//! deployment manifest (collector plus config-reloader sidecar, platform
//! exporter, dashboard, dashboard reloader) to the deployment sink and opens
//! the container-network paths between the stack members.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::errors::ReconcileResult;
use crate::domain::models::{
    AppManifest, DockerConfig, EngineConfig, Manifest, ManifestMetadata, ManifestRoute,
    ResourceRequest, Sidecar, DEFAULT_SCRAPE_PORT,
};
use crate::domain::ports::DeploymentSink;
use crate::services::ResourceReconciler;

/// Drives the provisioning path: backing resource, stack deployment, network
/// policies.
pub struct Provisioner {
    reconciler: ResourceReconciler,
    sink: Arc<dyn DeploymentSink>,
    config: EngineConfig,
}

impl Provisioner {
    pub fn new(
        reconciler: ResourceReconciler,
        sink: Arc<dyn DeploymentSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            reconciler,
            sink,
            config,
        }
    }

    /// Converge the platform towards a fully deployed observability stack.
    ///
    /// The backing resource must reach its terminal success state before the
    /// stack is deployed; the deploy itself is an idempotent
    /// deploy-or-update. Network policies are best-effort.
    pub async fn provision(&self, shutdown: &mut broadcast::Receiver<()>) -> ReconcileResult<()> {
        let request = ResourceRequest {
            offering: self.config.datastore.offering.clone(),
            plan: self.config.datastore.plan.clone(),
            instance_name: self.config.datastore.instance_name.clone(),
        };
        self.reconciler.reconcile(&request, shutdown).await?;

        let manifest = self.stack_manifest();
        info!(
            applications = manifest.applications.len(),
            "deploying observability stack"
        );
        self.sink.deploy(&manifest).await?;

        for (source, destination, port) in self.network_policies() {
            if let Err(err) = self.sink.add_network_policy(source, destination, port).await {
                warn!(
                    source,
                    destination,
                    port,
                    error = %err,
                    "failed to add network policy"
                );
            }
        }
        Ok(())
    }

    /// The stack's deployment manifest, built from configuration.
    pub fn stack_manifest(&self) -> Manifest {
        let stack = &self.config.stack;
        let datastore = &self.config.datastore;
        let collector_route = format!("{}.{}", stack.collector_app, stack.internal_domain);
        let exporter_route = format!("{}.{}", stack.exporter_app, stack.internal_domain);
        let dashboard_route = format!("{}.{}", stack.dashboard_app, stack.internal_domain);

        let collector = AppManifest {
            name: stack.collector_app.clone(),
            metadata: Some(self.owner_metadata()),
            memory: Some("512M".into()),
            disk_quota: Some("4G".into()),
            instances: Some(1),
            health_check_type: Some("port".into()),
            routes: vec![ManifestRoute {
                route: collector_route.clone(),
            }],
            buildpacks: vec![stack.collector_buildpack.clone()],
            path: Some(format!("{}/prometheus", stack.apps_path)),
            env: {
                let mut env = self.platform_env();
                env.insert(
                    "PROMETHEUS_FLAGS".into(),
                    [
                        "--storage.tsdb.retention.size=3GB",
                        "--web.external-url=http://localhost",
                        "--config.file=config.yml",
                    ]
                    .join(" "),
                );
                env
            },
            services: vec![datastore.instance_name.clone()],
            sidecars: vec![Sidecar {
                name: "config-reloader".into(),
                process_types: vec!["web".into()],
                command: "./vigil scrape-loop".into(),
            }],
            ..AppManifest::default()
        };

        let exporter = AppManifest {
            name: stack.exporter_app.clone(),
            metadata: Some(self.owner_metadata()),
            memory: Some("256M".into()),
            disk_quota: Some("1G".into()),
            instances: Some(1),
            health_check_type: Some("port".into()),
            routes: vec![ManifestRoute {
                route: exporter_route,
            }],
            buildpacks: vec!["binary_buildpack".into()],
            path: Some(format!("{}/platform-exporter", stack.apps_path)),
            env: {
                let mut env = self.platform_env();
                env.insert("UPDATE_FREQUENCY".into(), "300".into());
                env.insert("SCRAPE_INTERVAL".into(), "60".into());
                env
            },
            ..AppManifest::default()
        };

        let dashboard = AppManifest {
            name: stack.dashboard_app.clone(),
            metadata: Some(self.owner_metadata()),
            memory: Some("256M".into()),
            disk_quota: Some("1G".into()),
            instances: Some(1),
            health_check_type: Some("port".into()),
            routes: vec![ManifestRoute {
                route: dashboard_route.clone(),
            }],
            docker: Some(DockerConfig {
                image: stack.dashboard_image.clone(),
            }),
            command: Some("/run.sh".into()),
            env: BTreeMap::from([
                (
                    "GF_SECURITY_ADMIN_USER".to_string(),
                    stack.dashboard_admin_user.clone(),
                ),
                (
                    "GF_SECURITY_ADMIN_PASSWORD".to_string(),
                    stack.dashboard_admin_password.clone(),
                ),
                (
                    "GF_SERVER_HTTP_PORT".to_string(),
                    stack.dashboard_port.to_string(),
                ),
            ]),
            services: vec![datastore.instance_name.clone()],
            ..AppManifest::default()
        };

        let dashboard_reloader = AppManifest {
            name: stack.dashboard_reloader_app.clone(),
            metadata: Some(self.owner_metadata()),
            memory: Some("128M".into()),
            disk_quota: Some("1G".into()),
            instances: Some(1),
            no_route: true,
            health_check_type: Some("process".into()),
            buildpacks: vec!["binary_buildpack".into()],
            path: Some(format!("{}/vigil", stack.apps_path)),
            command: Some("./vigil datasource-loop".into()),
            env: {
                let mut env = self.platform_env();
                env.insert(
                    "VIGIL_DASHBOARD__API_ENDPOINT".into(),
                    format!("http://{}:{}", dashboard_route, stack.dashboard_port),
                );
                env.insert(
                    "VIGIL_DASHBOARD__USERNAME".into(),
                    stack.dashboard_admin_user.clone(),
                );
                env.insert(
                    "VIGIL_DASHBOARD__PASSWORD".into(),
                    stack.dashboard_admin_password.clone(),
                );
                env.insert(
                    "VIGIL_DASHBOARD__COLLECTOR_URL".into(),
                    format!("http://{collector_route}:{DEFAULT_SCRAPE_PORT}"),
                );
                env
            },
            services: vec![datastore.instance_name.clone()],
            ..AppManifest::default()
        };

        Manifest {
            applications: vec![collector, exporter, dashboard, dashboard_reloader],
        }
    }

    /// Network paths between stack members: reloader to dashboard, dashboard
    /// to collector, collector to exporter and to the dashboard itself.
    fn network_policies(&self) -> Vec<(&str, &str, u16)> {
        let stack = &self.config.stack;
        vec![
            (
                stack.dashboard_reloader_app.as_str(),
                stack.dashboard_app.as_str(),
                stack.dashboard_port,
            ),
            (
                stack.dashboard_app.as_str(),
                stack.collector_app.as_str(),
                DEFAULT_SCRAPE_PORT,
            ),
            (
                stack.collector_app.as_str(),
                stack.exporter_app.as_str(),
                DEFAULT_SCRAPE_PORT,
            ),
            (
                stack.collector_app.as_str(),
                stack.dashboard_app.as_str(),
                stack.dashboard_port,
            ),
        ]
    }

    fn owner_metadata(&self) -> ManifestMetadata {
        ManifestMetadata {
            labels: BTreeMap::from([(
                "owner".to_string(),
                self.config.stack.owner_label.clone(),
            )]),
        }
    }

    /// Platform credentials handed to deployed components so they can run
    /// their own convergence loops.
    fn platform_env(&self) -> BTreeMap<String, String> {
        let platform = &self.config.platform;
        let mut env = BTreeMap::from([
            (
                "VIGIL_PLATFORM__API_ENDPOINT".to_string(),
                platform.api_endpoint.clone(),
            ),
            ("VIGIL_PLATFORM__USERNAME".to_string(), platform.username.clone()),
            ("VIGIL_PLATFORM__PASSWORD".to_string(), platform.password.clone()),
            ("VIGIL_PLATFORM__ORG_NAME".to_string(), platform.org_name.clone()),
            (
                "VIGIL_PLATFORM__SPACE_NAME".to_string(),
                platform.space_name.clone(),
            ),
        ]);
        if let Some(guid) = self.config.collector.instance_guid {
            env.insert("VIGIL_COLLECTOR__INSTANCE_GUID".into(), guid.to_string());
        }
        env
    }
}
