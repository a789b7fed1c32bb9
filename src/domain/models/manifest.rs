//! Declarative deployment manifests handed to the deployment sink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A deployable set of applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub applications: Vec<AppManifest>,
}

/// One application within a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ManifestMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_quota: Option<String>,

    /// Local path of the application bits, relative to the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<ManifestRoute>,

    #[serde(default, rename = "no-route", skip_serializing_if = "std::ops::Not::not")]
    pub no_route: bool,

    #[serde(default, rename = "health-check-type", skip_serializing_if = "Option::is_none")]
    pub health_check_type: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,

    /// Names of bound resource instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<Sidecar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// A route entry in an application manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRoute {
    pub route: String,
}

/// A companion process deployed alongside the main application process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub name: String,
    pub process_types: Vec<String>,
    pub command: String,
}

/// Label metadata attached to a deployed application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Container image reference for image-based applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_yaml_shape() {
        let manifest = Manifest {
            applications: vec![AppManifest {
                name: "collector".into(),
                memory: Some("512M".into()),
                routes: vec![ManifestRoute {
                    route: "collector.apps.internal".into(),
                }],
                sidecars: vec![Sidecar {
                    name: "config-reloader".into(),
                    process_types: vec!["web".into()],
                    command: "./config-reloader".into(),
                }],
                ..AppManifest::default()
            }],
        };
        let yaml = serde_yaml::to_string(&manifest).unwrap();
        assert!(yaml.contains("applications:"));
        assert!(yaml.contains("name: collector"));
        assert!(yaml.contains("route: collector.apps.internal"));
        assert!(yaml.contains("process_types:"));
        // defaults stay out of the document
        assert!(!yaml.contains("no-route"));
        assert!(!yaml.contains("docker"));
    }
}
