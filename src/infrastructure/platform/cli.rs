//! Deployment through the platform's command-line client.
//!
//! Deploys run out of a staging directory: application sources named by the
//! manifest are copied in, the manifest is rewritten against the staged
//! layout, and the CLI pushes the whole thing in one shot. A single lock
//! serializes all CLI invocations since the client keeps per-process target
//! state on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::models::{Manifest, PlatformConfig};
use crate::domain::ports::{DeployError, DeploymentSink};

/// `DeploymentSink` backed by the platform CLI.
pub struct CliDeployer {
    binary: String,
    api_endpoint: String,
    username: String,
    password: String,
    org_name: String,
    space_name: String,
    skip_ssl_validation: bool,
    apps_root: PathBuf,
    lock: Mutex<()>,
}

impl CliDeployer {
    pub fn new(config: &PlatformConfig, apps_root: impl Into<PathBuf>) -> Self {
        Self {
            binary: config.cli_binary.clone(),
            api_endpoint: config.api_endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            org_name: config.org_name.clone(),
            space_name: config.space_name.clone(),
            skip_ssl_validation: config.skip_ssl_validation,
            apps_root: apps_root.into(),
            lock: Mutex::new(()),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<(), DeployError> {
        self.run_in(None, args).await
    }

    async fn run_in(&self, cwd: Option<&Path>, args: &[&str]) -> Result<(), DeployError> {
        debug!(binary = %self.binary, ?args, "invoking platform cli");
        let mut command = Command::new(&self.binary);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        let status = command.status().await?;
        if !status.success() {
            return Err(DeployError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                code: status.code(),
            });
        }
        Ok(())
    }

    async fn login(&self) -> Result<(), DeployError> {
        let mut api_args = vec!["api", self.api_endpoint.as_str()];
        if self.skip_ssl_validation {
            api_args.push("--skip-ssl-validation");
        }
        self.run(&api_args).await?;
        self.run(&["auth", self.username.as_str(), self.password.as_str()])
            .await?;
        self.run(&[
            "target",
            "-o",
            self.org_name.as_str(),
            "-s",
            self.space_name.as_str(),
        ])
        .await
    }

    /// Copy application sources into the staging directory and rewrite the
    /// manifest's paths against it.
    fn stage(&self, manifest: &Manifest, staging: &Path) -> Result<Manifest, DeployError> {
        let mut staged = manifest.clone();
        for app in &mut staged.applications {
            let Some(source) = app.path.take() else {
                continue;
            };
            let name = Path::new(&source)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| app.name.clone());
            copy_dir(&self.apps_root.join(&source), &staging.join(&name))?;
            app.path = Some(format!("./{name}"));
        }
        Ok(staged)
    }
}

fn copy_dir(source: &Path, destination: &Path) -> Result<(), DeployError> {
    std::fs::create_dir_all(destination)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[async_trait]
impl DeploymentSink for CliDeployer {
    async fn deploy(&self, manifest: &Manifest) -> Result<(), DeployError> {
        let _guard = self.lock.lock().await;
        let staging = tempfile::tempdir()?;

        let staged = self.stage(manifest, staging.path())?;
        let rendered = serde_yaml::to_string(&staged)?;
        tokio::fs::write(staging.path().join("manifest.yml"), rendered).await?;

        self.login().await?;
        info!(
            applications = staged.applications.len(),
            "pushing stack manifest"
        );
        self.run_in(Some(staging.path()), &["push", "-f", "manifest.yml"])
            .await
    }

    async fn add_network_policy(
        &self,
        source_app: &str,
        destination_app: &str,
        port: u16,
    ) -> Result<(), DeployError> {
        let _guard = self.lock.lock().await;
        self.login().await?;
        let port = port.to_string();
        self.run(&[
            "add-network-policy",
            source_app,
            destination_app,
            "--port",
            port.as_str(),
            "--protocol",
            "tcp",
        ])
        .await
    }
}
