//! One-shot idempotent provisioning of a backing resource instance.
//!
//! Checks for an existing instance by (space, name), creates one from the
//! requested offering/plan if absent, then polls until the instance reaches
//! its terminal success state or the caller cancels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{ReconcileError, ReconcileResult};
use crate::domain::models::{LastOperationState, ResourceRequest};
use crate::domain::ports::PlatformClient;
use crate::services::inspector::StateInspector;

/// Interval between lifecycle-state polls after creation.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Reconciles one desired backing resource at provisioning time.
pub struct ResourceReconciler {
    platform: Arc<dyn PlatformClient>,
    inspector: StateInspector,
    space_guid: Uuid,
    poll_interval: Duration,
}

impl ResourceReconciler {
    pub fn new(platform: Arc<dyn PlatformClient>, space_guid: Uuid) -> Self {
        let inspector = StateInspector::new(Arc::clone(&platform));
        Self {
            platform,
            inspector,
            space_guid,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the poll interval (tests use a short one).
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Converge the platform towards `desired`.
    ///
    /// Idempotent: an already-existing instance is a successful no-op. More
    /// than one matching instance is ambiguous and not auto-healable, so it
    /// fails with a duplicate-resource error. Creation errors for missing
    /// offerings or plans are configuration errors, not transient ones.
    pub async fn reconcile(
        &self,
        desired: &ResourceRequest,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ReconcileResult<()> {
        let existing = self
            .platform
            .list_instances(self.space_guid, &desired.instance_name)
            .await?;
        match existing.len() {
            0 => {}
            1 => {
                debug!(
                    instance = %desired.instance_name,
                    "resource instance already exists, nothing to do"
                );
                return Ok(());
            }
            count => {
                return Err(ReconcileError::DuplicateInstance {
                    name: desired.instance_name.clone(),
                    count,
                })
            }
        }

        let offering = self
            .platform
            .find_offering(&desired.offering)
            .await?
            .ok_or_else(|| ReconcileError::OfferingNotFound(desired.offering.clone()))?;
        let plan = self
            .platform
            .list_plans(offering.guid)
            .await?
            .into_iter()
            .find(|p| p.name == desired.plan)
            .ok_or_else(|| ReconcileError::PlanNotFound(desired.plan.clone()))?;

        let instance = self
            .platform
            .create_instance(self.space_guid, plan.guid, &desired.instance_name)
            .await?;
        info!(
            instance = %desired.instance_name,
            guid = %instance.guid,
            "created resource instance, waiting for it to become ready"
        );
        self.wait_for_state(instance.guid, LastOperationState::Succeeded, shutdown)
            .await
    }

    /// Poll the instance's lifecycle state until it reaches `target`.
    ///
    /// Cancellation wins immediately over the pending poll; there is no
    /// upper bound on retries other than cancellation.
    async fn wait_for_state(
        &self,
        instance_guid: Uuid,
        target: LastOperationState,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> ReconcileResult<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return Err(ReconcileError::Canceled),
                () = sleep(self.poll_interval) => {
                    let state = self.inspector.instance_state(instance_guid).await?;
                    info!(
                        instance = %instance_guid,
                        state = %state,
                        target = %target,
                        "wait-for-state"
                    );
                    if state == target {
                        return Ok(());
                    }
                }
            }
        }
    }
}
