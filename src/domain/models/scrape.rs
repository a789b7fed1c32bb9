//! The generated scrape-config document.
//!
//! Mirrors the collector's configuration file format closely enough to merge
//! a static base document with discovered targets and write the result back
//! out as YAML. Maps use `BTreeMap` so serialization is canonical: the
//! convergence loop diffs serialized bytes to decide whether a disruptive
//! reload is needed at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Port assumed when a route carries no destination port metadata.
pub const DEFAULT_SCRAPE_PORT: u16 = 8080;

/// Interval between scrapes and between target refreshes.
pub const DEFAULT_SCRAPE_INTERVAL: &str = "30s";

/// Path the collector polls for metric samples.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Top-level scrape configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeDocument {
    #[serde(default, skip_serializing_if = "GlobalSettings::is_empty")]
    pub global: GlobalSettings,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scrape_configs: Vec<ScrapeJob>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_read: Vec<RemoteReadBackend>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<RemoteWriteBackend>,
}

impl ScrapeDocument {
    /// Serialize to the canonical byte form used for snapshot diffing and
    /// for the on-disk config file.
    pub fn to_canonical_yaml(&self) -> Result<Vec<u8>, serde_yaml::Error> {
        serde_yaml::to_string(self).map(String::into_bytes)
    }
}

/// Global collector settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_interval: Option<String>,

    /// Labels attached to every sample leaving this collector.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_labels: BTreeMap<String, String>,
}

impl GlobalSettings {
    fn is_empty(&self) -> bool {
        self.scrape_interval.is_none()
            && self.evaluation_interval.is_none()
            && self.external_labels.is_empty()
    }
}

/// One scrape job: a named set of targets polled on an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub job_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_sd_configs: Vec<DnsSdTargets>,

    /// Statically listed targets, kept for base-config passthrough.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_configs: Vec<StaticTargets>,
}

impl ScrapeJob {
    /// A discovered job for one workload: DNS-A targets on the default
    /// scrape interval and metrics path.
    pub fn discovered(job_name: impl Into<String>, dns_sd_configs: Vec<DnsSdTargets>) -> Self {
        Self {
            job_name: job_name.into(),
            scrape_interval: Some(DEFAULT_SCRAPE_INTERVAL.to_string()),
            metrics_path: Some(DEFAULT_METRICS_PATH.to_string()),
            scheme: None,
            dns_sd_configs,
            static_configs: Vec::new(),
        }
    }
}

/// A DNS service-discovery block: names resolved as A records on a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSdTargets {
    pub names: Vec<String>,

    #[serde(rename = "type")]
    pub record_type: String,

    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
}

impl DnsSdTargets {
    /// A single-name A-record block with the default refresh interval.
    pub fn a_record(name: impl Into<String>, port: u16) -> Self {
        Self {
            names: vec![name.into()],
            record_type: "A".to_string(),
            port,
            refresh_interval: Some(DEFAULT_SCRAPE_INTERVAL.to_string()),
        }
    }
}

/// Statically configured targets inside a scrape job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTargets {
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Basic-auth credentials for a remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuthSettings {
    pub username: String,
    pub password: String,
}

/// A remote-read backend the collector queries for historical samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReadBackend {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthSettings>,
}

/// A remote-write backend the collector ships samples to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWriteBackend {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthSettings>,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn canonical_yaml_is_stable_across_label_insertion_order() {
        let mut a = ScrapeDocument::default();
        a.global.external_labels.insert("deployment".into(), "test".into());
        a.global.external_labels.insert("alpha".into(), "1".into());

        let mut b = ScrapeDocument::default();
        b.global.external_labels.insert("alpha".into(), "1".into());
        b.global.external_labels.insert("deployment".into(), "test".into());

        assert_eq!(
            a.to_canonical_yaml().unwrap(),
            b.to_canonical_yaml().unwrap()
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        let doc = ScrapeDocument {
            scrape_configs: vec![ScrapeJob::discovered(
                "app",
                vec![DnsSdTargets::a_record("app.apps.internal", 9090)],
            )],
            ..ScrapeDocument::default()
        };
        let yaml = String::from_utf8(doc.to_canonical_yaml().unwrap()).unwrap();
        assert!(!yaml.contains("remote_read"));
        assert!(!yaml.contains("remote_write"));
        assert!(!yaml.contains("global"));
        assert!(yaml.contains("job_name: app"));
        assert!(yaml.contains("type: A"));
        assert!(yaml.contains("port: 9090"));
    }

    #[test]
    fn base_document_round_trips() {
        let yaml = r"
global:
  scrape_interval: 15s
  external_labels:
    region: eu-west-1
scrape_configs:
- job_name: self
  static_configs:
  - targets:
    - localhost:9090
";
        let doc: ScrapeDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.global.scrape_interval.as_deref(), Some("15s"));
        assert_eq!(doc.scrape_configs.len(), 1);
        assert_eq!(doc.scrape_configs[0].static_configs[0].targets[0], "localhost:9090");
    }

    proptest! {
        /// The canonical form depends only on the labels, never on the order
        /// discovery happened to produce them in.
        #[test]
        fn canonical_yaml_ignores_label_order(
            labels in prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{1,8}", 0..6)
        ) {
            let mut forward = ScrapeDocument::default();
            for (key, value) in &labels {
                forward.global.external_labels.insert(key.clone(), value.clone());
            }
            let mut reverse = ScrapeDocument::default();
            for (key, value) in labels.iter().rev() {
                reverse.global.external_labels.insert(key.clone(), value.clone());
            }
            prop_assert_eq!(
                forward.to_canonical_yaml().unwrap(),
                reverse.to_canonical_yaml().unwrap()
            );
        }
    }
}
