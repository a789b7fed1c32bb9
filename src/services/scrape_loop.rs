//! Scrape-config convergence loop.
//!
//! Each cycle builds the desired document, serializes it canonically, and
//! diffs the bytes against the last applied snapshot. Reloading the collector
//! drops in-flight scrapes, so identical output is skipped outright; only a
//! changed document is written and signaled. The snapshot lives in memory
//! only, so a process restart forces one unconditional re-apply.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::domain::errors::{ReconcileError, ReconcileResult};
use crate::domain::ports::ReloadNotifier;
use crate::services::scrape_discovery::ScrapeDiscovery;

/// Interval while no snapshot has ever been applied, to minimize cold-start
/// latency.
pub const COLD_START_INTERVAL: Duration = Duration::from_secs(2);

/// Sleep after a failed cycle, superseding the normal interval once.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(30);

/// Outcome of one convergence cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergeOutcome {
    /// A new document was written and the collector signaled.
    Applied,
    /// The desired document matched the snapshot; nothing touched.
    Unchanged,
}

/// Tunable intervals for the loop.
#[derive(Debug, Clone)]
pub struct ScrapeLoopIntervals {
    pub steady: Duration,
    pub cold_start: Duration,
    pub error_backoff: Duration,
}

impl Default for ScrapeLoopIntervals {
    fn default() -> Self {
        Self {
            steady: Duration::from_secs(60),
            cold_start: COLD_START_INTERVAL,
            error_backoff: ERROR_BACKOFF,
        }
    }
}

/// The convergence loop for the collector's scrape configuration.
pub struct ScrapeConfigLoop {
    discovery: ScrapeDiscovery,
    target_config_path: PathBuf,
    notifier: Arc<dyn ReloadNotifier>,
    intervals: ScrapeLoopIntervals,
    /// Last successfully applied serialized document. Read and written only
    /// inside `converge`'s critical section.
    snapshot: Mutex<Option<Vec<u8>>>,
}

impl ScrapeConfigLoop {
    pub fn new(
        discovery: ScrapeDiscovery,
        target_config_path: impl Into<PathBuf>,
        notifier: Arc<dyn ReloadNotifier>,
    ) -> Self {
        Self {
            discovery,
            target_config_path: target_config_path.into(),
            notifier,
            intervals: ScrapeLoopIntervals::default(),
            snapshot: Mutex::new(None),
        }
    }

    pub fn with_intervals(mut self, intervals: ScrapeLoopIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Run until the shutdown signal fires. Cycle errors are logged and
    /// followed by a fixed back-off; the loop itself never gives up.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ReconcileResult<()> {
        loop {
            let interval = if self.snapshot.lock().await.is_some() {
                self.intervals.steady
            } else {
                self.intervals.cold_start
            };
            debug!(in_secs = interval.as_secs(), "next scrape config convergence");
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                () = sleep(interval) => {
                    if let Err(err) = self.converge().await {
                        error!(error = %err, phase = "scrape-config", "convergence cycle failed");
                        tokio::select! {
                            _ = shutdown.recv() => return Ok(()),
                            () = sleep(self.intervals.error_backoff) => {}
                        }
                    }
                }
            }
        }
    }

    /// One build-diff-apply cycle.
    ///
    /// The snapshot is updated only after both the write and the reload
    /// signal succeed, so a failed apply is retried with the same content on
    /// the next cycle.
    pub async fn converge(&self) -> ReconcileResult<ConvergeOutcome> {
        let mut snapshot = self.snapshot.lock().await;

        let document = self.discovery.build().await?;
        let rendered = document.to_canonical_yaml()?;
        if rendered.is_empty() {
            return Err(ReconcileError::EmptyRendered);
        }
        if snapshot.as_deref() == Some(rendered.as_slice()) {
            debug!("scrape config unchanged");
            return Ok(ConvergeOutcome::Unchanged);
        }

        info!(
            path = %self.target_config_path.display(),
            bytes = rendered.len(),
            "writing scrape config"
        );
        tokio::fs::write(&self.target_config_path, &rendered).await?;
        self.notifier.notify().await?;
        *snapshot = Some(rendered);
        Ok(ConvergeOutcome::Applied)
    }

    /// Whether a document has ever been applied in this process.
    pub async fn has_applied(&self) -> bool {
        self.snapshot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::domain::models::RouteDestination;
    use crate::domain::ports::ReloadError;
    use crate::services::test_support::FakePlatform;

    use super::*;

    #[derive(Default)]
    struct CountingNotifier {
        notifications: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ReloadNotifier for CountingNotifier {
        async fn notify(&self) -> Result<(), ReloadError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ReloadError::Endpoint { status: 500 });
            }
            self.notifications.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const BASE: &str = "
scrape_configs:
- job_name: static-job
  static_configs:
  - targets:
    - localhost:9090
";

    struct Fixture {
        platform: Arc<FakePlatform>,
        notifier: Arc<CountingNotifier>,
        loop_: ScrapeConfigLoop,
        instance: Uuid,
        _base: tempfile::NamedTempFile,
        target: tempfile::NamedTempFile,
    }

    fn fixture() -> Fixture {
        let platform = Arc::new(FakePlatform::default());
        let instance = Uuid::new_v4();
        let mut base = tempfile::NamedTempFile::new().unwrap();
        base.write_all(BASE.as_bytes()).unwrap();
        let target = tempfile::NamedTempFile::new().unwrap();
        let notifier = Arc::new(CountingNotifier::default());
        let discovery = ScrapeDiscovery::new(
            Arc::clone(&platform) as Arc<dyn crate::domain::ports::PlatformClient>,
            instance,
            base.path(),
        );
        let loop_ = ScrapeConfigLoop::new(
            discovery,
            target.path(),
            Arc::clone(&notifier) as Arc<dyn ReloadNotifier>,
        );
        Fixture {
            platform,
            notifier,
            loop_,
            instance,
            _base: base,
            target,
        }
    }

    fn web(port: u16) -> RouteDestination {
        RouteDestination {
            port: Some(port),
            process_role: "web".into(),
        }
    }

    #[tokio::test]
    async fn first_cycle_applies_second_skips() {
        let f = fixture();
        f.platform
            .add_bound_workload(f.instance, "app", "app", "apps.internal", true, vec![web(9090)]);

        assert_eq!(f.loop_.converge().await.unwrap(), ConvergeOutcome::Applied);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 1);
        let written = std::fs::read_to_string(f.target.path()).unwrap();
        assert!(written.contains("job_name: app"));
        assert!(written.contains("app.apps.internal"));

        // identical desired state: no write, no signal
        assert_eq!(f.loop_.converge().await.unwrap(), ConvergeOutcome::Unchanged);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_desired_state_reapplies_exactly_once() {
        let f = fixture();
        f.platform
            .add_bound_workload(f.instance, "app", "app", "apps.internal", true, vec![web(9090)]);
        f.loop_.converge().await.unwrap();

        f.platform
            .add_bound_workload(f.instance, "other", "other", "apps.internal", true, vec![web(8080)]);
        assert_eq!(f.loop_.converge().await.unwrap(), ConvergeOutcome::Applied);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 2);
        let written = std::fs::read_to_string(f.target.path()).unwrap();
        assert!(written.contains("job_name: other"));
    }

    #[tokio::test]
    async fn failed_signal_leaves_snapshot_unset_and_retries() {
        let f = fixture();
        f.platform
            .add_bound_workload(f.instance, "app", "app", "apps.internal", true, vec![web(9090)]);

        f.notifier.fail.store(true, Ordering::SeqCst);
        assert!(f.loop_.converge().await.is_err());
        assert!(!f.loop_.has_applied().await);

        // next cycle recomputes and applies the same content
        f.notifier.fail.store(false, Ordering::SeqCst);
        assert_eq!(f.loop_.converge().await.unwrap(), ConvergeOutcome::Applied);
        assert_eq!(f.notifier.notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_exits_promptly_on_shutdown() {
        let f = fixture();
        let (tx, rx) = broadcast::channel(1);
        let loop_ = Arc::new(f.loop_);
        let handle = {
            let loop_ = Arc::clone(&loop_);
            tokio::spawn(async move { loop_.run(rx).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop must observe shutdown within one tick")
            .unwrap()
            .unwrap();
    }
}
