//! Scrape-target discovery: from bindings to a full scrape-config document.
//!
//! Every cycle regenerates the document from scratch: a static base document
//! loaded from disk, one discovered job per bound workload with usable
//! internal routes, any statically configured extra jobs, external labels,
//! and remote-read/-write backends.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{ReconcileError, ReconcileResult};
use crate::domain::models::{
    DnsSdTargets, RemoteReadBackend, RemoteWriteBackend, ScrapeDocument, ScrapeJob,
};
use crate::domain::ports::PlatformClient;
use crate::services::inspector::StateInspector;

/// Builds the desired scrape-config document.
pub struct ScrapeDiscovery {
    platform: Arc<dyn PlatformClient>,
    inspector: StateInspector,
    /// Bindings of this resource instance drive discovery.
    instance_guid: Uuid,
    base_config_path: PathBuf,
    external_labels: BTreeMap<String, String>,
    extra_jobs: Vec<ScrapeJob>,
    remote_read: Vec<RemoteReadBackend>,
    remote_write: Vec<RemoteWriteBackend>,
}

impl ScrapeDiscovery {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        instance_guid: Uuid,
        base_config_path: impl Into<PathBuf>,
    ) -> Self {
        let inspector = StateInspector::new(Arc::clone(&platform));
        Self {
            platform,
            inspector,
            instance_guid,
            base_config_path: base_config_path.into(),
            external_labels: BTreeMap::new(),
            extra_jobs: Vec::new(),
            remote_read: Vec::new(),
            remote_write: Vec::new(),
        }
    }

    /// Labels appended to the document's global external labels.
    pub fn with_external_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.external_labels = labels;
        self
    }

    /// Statically configured scrape jobs appended after discovery.
    pub fn with_extra_jobs(mut self, jobs: Vec<ScrapeJob>) -> Self {
        self.extra_jobs = jobs;
        self
    }

    /// Statically configured remote backends.
    pub fn with_remote_backends(
        mut self,
        read: Vec<RemoteReadBackend>,
        write: Vec<RemoteWriteBackend>,
    ) -> Self {
        self.remote_read = read;
        self.remote_write = write;
        self
    }

    /// Build the full desired document.
    ///
    /// Any platform API failure aborts the whole build; the caller decides
    /// whether to retry on the next cycle.
    pub async fn build(&self) -> ReconcileResult<ScrapeDocument> {
        let mut document = self.load_base().await?;
        document
            .scrape_configs
            .extend(self.discover_jobs().await?);
        document.scrape_configs.extend(self.extra_jobs.clone());
        for (name, value) in &self.external_labels {
            document
                .global
                .external_labels
                .insert(name.clone(), value.clone());
        }
        document.remote_read.extend(self.remote_read.clone());
        document.remote_write.extend(self.remote_write.clone());
        Ok(document)
    }

    async fn load_base(&self) -> ReconcileResult<ScrapeDocument> {
        let path = self.base_config_path.display().to_string();
        let raw = tokio::fs::read_to_string(&self.base_config_path)
            .await
            .map_err(|err| ReconcileError::BaseConfig {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        // every document field has a serde default, so an empty file would
        // otherwise parse into an empty document instead of failing
        if raw.trim().is_empty() {
            return Err(ReconcileError::BaseConfig {
                path,
                reason: "file is empty".to_string(),
            });
        }
        serde_yaml::from_str(&raw).map_err(|err| ReconcileError::BaseConfig {
            path,
            reason: err.to_string(),
        })
    }

    /// One scrape job per bound workload with at least one usable address.
    async fn discover_jobs(&self) -> ReconcileResult<Vec<ScrapeJob>> {
        let bindings = self.platform.list_bindings(self.instance_guid).await?;
        let mut jobs = Vec::new();
        for binding in bindings {
            let workload = self.platform.get_workload(binding.app_guid).await?;
            let endpoints = self.inspector.workload_endpoints(workload.guid).await?;
            if endpoints.is_empty() {
                info!(workload = %workload.name, "skipping workload with no route mappings");
                continue;
            }

            // first web-typed destination wins per route; non-internal
            // domains never become scrape targets
            let mut targets = Vec::new();
            let mut claimed = HashSet::new();
            for endpoint in endpoints {
                if !endpoint.internal {
                    debug!(
                        workload = %workload.name,
                        address = %endpoint.address,
                        "skipping non-internal route"
                    );
                    continue;
                }
                if endpoint.process_role != "web" {
                    debug!(
                        workload = %workload.name,
                        address = %endpoint.address,
                        role = %endpoint.process_role,
                        "skipping non-web destination"
                    );
                    continue;
                }
                if !claimed.insert(endpoint.address.clone()) {
                    continue;
                }
                debug!(
                    workload = %workload.name,
                    address = %endpoint.address,
                    port = endpoint.port,
                    "adding DNS target"
                );
                targets.push(DnsSdTargets::a_record(endpoint.address, endpoint.port));
            }

            if targets.is_empty() {
                warn!(
                    workload = %workload.name,
                    "skipping workload with no usable internal routes"
                );
                continue;
            }
            jobs.push(ScrapeJob::discovered(workload.name, targets));
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use proptest::prelude::*;

    use crate::domain::models::RouteDestination;
    use crate::services::test_support::FakePlatform;

    use super::*;

    const BASE: &str = "
scrape_configs:
- job_name: static-job
  static_configs:
  - targets:
    - localhost:9090
";

    fn base_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn web(port: u16) -> RouteDestination {
        RouteDestination {
            port: Some(port),
            process_role: "web".into(),
        }
    }

    #[tokio::test]
    async fn internal_route_becomes_dns_a_target_alongside_static_job() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        platform.add_bound_workload(instance, "app", "app", "apps.internal", true, vec![web(9090)]);
        let base = base_file(BASE);

        let document = ScrapeDiscovery::new(platform, instance, base.path())
            .build()
            .await
            .unwrap();

        assert_eq!(document.scrape_configs.len(), 2);
        assert_eq!(document.scrape_configs[0].job_name, "static-job");
        let discovered = &document.scrape_configs[1];
        assert_eq!(discovered.job_name, "app");
        assert_eq!(discovered.metrics_path.as_deref(), Some("/metrics"));
        assert_eq!(discovered.scrape_interval.as_deref(), Some("30s"));
        let dns = &discovered.dns_sd_configs[0];
        assert_eq!(dns.names, vec!["app.apps.internal"]);
        assert_eq!(dns.record_type, "A");
        assert_eq!(dns.port, 9090);
    }

    #[tokio::test]
    async fn non_internal_routes_are_never_scraped() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        platform.add_bound_workload(
            instance,
            "public-app",
            "public-app",
            "example.com",
            false,
            vec![web(8080)],
        );
        let base = base_file(BASE);

        let document = ScrapeDiscovery::new(platform, instance, base.path())
            .build()
            .await
            .unwrap();

        // only the static job survives; the workload is skipped, not an error
        assert_eq!(document.scrape_configs.len(), 1);
        assert_eq!(document.scrape_configs[0].job_name, "static-job");
    }

    #[tokio::test]
    async fn workload_without_route_mappings_is_skipped() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        platform.add_routeless_workload(instance, "routeless");
        platform.add_bound_workload(instance, "app", "app", "apps.internal", true, vec![web(9090)]);
        let base = base_file(BASE);

        let document = ScrapeDiscovery::new(platform, instance, base.path())
            .build()
            .await
            .unwrap();

        let jobs: Vec<_> = document
            .scrape_configs
            .iter()
            .map(|j| j.job_name.as_str())
            .collect();
        assert_eq!(jobs, vec!["static-job", "app"]);
    }

    #[tokio::test]
    async fn first_web_destination_wins() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        platform.add_bound_workload(
            instance,
            "app",
            "app",
            "apps.internal",
            true,
            vec![
                RouteDestination {
                    port: Some(7070),
                    process_role: "worker".into(),
                },
                web(9090),
                web(9191),
            ],
        );
        let base = base_file(BASE);

        let document = ScrapeDiscovery::new(platform, instance, base.path())
            .build()
            .await
            .unwrap();

        let dns = &document.scrape_configs[1].dns_sd_configs;
        assert_eq!(dns.len(), 1);
        assert_eq!(dns[0].port, 9090);
    }

    #[tokio::test]
    async fn merges_labels_extra_jobs_and_remote_backends() {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        let base = base_file(BASE);

        let mut labels = BTreeMap::new();
        labels.insert("deployment".to_string(), "staging".to_string());
        let document = ScrapeDiscovery::new(platform, instance, base.path())
            .with_external_labels(labels)
            .with_extra_jobs(vec![ScrapeJob::discovered(
                "paas-exporter",
                vec![DnsSdTargets::a_record("exporter.apps.internal", 8080)],
            )])
            .with_remote_backends(
                vec![RemoteReadBackend {
                    url: "https://tsdb.example/read".into(),
                    basic_auth: None,
                }],
                vec![RemoteWriteBackend {
                    url: "https://tsdb.example/write".into(),
                    basic_auth: None,
                }],
            )
            .build()
            .await
            .unwrap();

        assert_eq!(
            document.global.external_labels.get("deployment").map(String::as_str),
            Some("staging")
        );
        assert_eq!(document.scrape_configs.len(), 2);
        assert_eq!(document.scrape_configs[1].job_name, "paas-exporter");
        assert_eq!(document.remote_read.len(), 1);
        assert_eq!(document.remote_write.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_base_config_is_a_config_error() {
        let platform = Arc::new(FakePlatform::default());
        let err = ScrapeDiscovery::new(platform, Uuid::new_v4(), "/does/not/exist.yml")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::BaseConfig { .. }));
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn empty_base_config_is_a_config_error() {
        for contents in ["", "\n   \n"] {
            let platform = Arc::new(FakePlatform::default());
            let base = base_file(contents);
            let err = ScrapeDiscovery::new(platform, Uuid::new_v4(), base.path())
                .build()
                .await
                .unwrap_err();
            assert!(matches!(err, ReconcileError::BaseConfig { .. }));
            assert!(err.is_config());
        }
    }

    proptest! {
        /// Whatever mix of domains the platform reports, an address reaches
        /// the document exactly when its domain is internal.
        #[test]
        fn only_internal_domains_become_targets(
            internal_flags in prop::collection::vec(any::<bool>(), 1..8)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let platform = Arc::new(FakePlatform::default());
                let instance = Uuid::new_v4();
                for (index, internal) in internal_flags.iter().enumerate() {
                    let host = format!("app{index}");
                    let domain = if *internal { "apps.internal" } else { "example.com" };
                    platform.add_bound_workload(
                        instance,
                        &host,
                        &host,
                        domain,
                        *internal,
                        vec![web(9090)],
                    );
                }
                let base = base_file(BASE);

                let document = ScrapeDiscovery::new(platform, instance, base.path())
                    .build()
                    .await
                    .unwrap();
                let yaml =
                    String::from_utf8(document.to_canonical_yaml().unwrap()).unwrap();

                for (index, internal) in internal_flags.iter().enumerate() {
                    let domain = if *internal { "apps.internal" } else { "example.com" };
                    let address = format!("app{index}.{domain}");
                    prop_assert_eq!(yaml.contains(&address), *internal);
                }
                Ok(())
            })?;
        }
    }
}
