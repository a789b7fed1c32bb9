//! Builds services and adapters out of loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::Provisioner;
use crate::domain::models::EngineConfig;
use crate::domain::ports::PlatformClient;
use crate::infrastructure::dashboard::HttpDashboardApi;
use crate::infrastructure::platform::{CliDeployer, HttpPlatformClient, Session};
use crate::infrastructure::reload::SignalReloadNotifier;
use crate::services::{
    DatasourceLoop, ResourceReconciler, ScrapeConfigLoop, ScrapeDiscovery, ScrapeLoopIntervals,
};

pub fn platform_client(config: &EngineConfig) -> Result<Arc<dyn PlatformClient>> {
    let session = Session::new(&config.platform).context("Failed to build platform session")?;
    Ok(Arc::new(HttpPlatformClient::new(session)))
}

/// The scrape-config loop, reloading a co-located collector process.
pub fn scrape_loop(config: &EngineConfig) -> Result<ScrapeConfigLoop> {
    let instance_guid = config
        .collector
        .instance_guid
        .context("collector.instance_guid must be set for the scrape loop")?;

    let discovery = ScrapeDiscovery::new(
        platform_client(config)?,
        instance_guid,
        &config.collector.base_config_path,
    )
    .with_external_labels(config.collector.external_labels.clone())
    .with_extra_jobs(config.collector.extra_scrape_configs.clone())
    .with_remote_backends(
        config.collector.remote_read.clone(),
        config.collector.remote_write.clone(),
    );

    let notifier = Arc::new(SignalReloadNotifier::new(
        config.collector.process_name.clone(),
    ));
    let intervals = ScrapeLoopIntervals {
        steady: Duration::from_secs(config.collector.poll_interval_secs),
        ..ScrapeLoopIntervals::default()
    };

    Ok(
        ScrapeConfigLoop::new(discovery, &config.collector.target_config_path, notifier)
            .with_intervals(intervals),
    )
}

/// The dashboard datasource loop.
pub fn datasource_loop(config: &EngineConfig) -> Result<DatasourceLoop> {
    let dashboard = Arc::new(
        HttpDashboardApi::new(&config.dashboard).context("Failed to build dashboard client")?,
    );
    Ok(DatasourceLoop::new(
        platform_client(config)?,
        dashboard,
        config.dashboard.datastore_instance_guid,
        config.dashboard.org_id,
    )
    .with_collector_url(config.dashboard.collector_url.clone())
    .with_interval(Duration::from_secs(config.dashboard.poll_interval_secs)))
}

/// The one-shot provisioner, deploying through the platform CLI.
pub fn provisioner(config: &EngineConfig) -> Result<Provisioner> {
    let space_guid = config
        .platform
        .space_guid
        .context("platform.space_guid must be set for provisioning")?;

    let reconciler = ResourceReconciler::new(platform_client(config)?, space_guid);
    let deployer = Arc::new(CliDeployer::new(&config.platform, "."));
    Ok(Provisioner::new(reconciler, deployer, config.clone()))
}
