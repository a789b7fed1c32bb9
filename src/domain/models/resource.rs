//! Backing resource instances and their lifecycle states.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A desired backing resource, identified by service offering, plan, and
/// instance name. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Service offering label, e.g. `influxdb`.
    pub offering: String,
    /// Plan name under the offering, e.g. `tiny-1.x`.
    pub plan: String,
    /// Name the provisioned instance should carry.
    pub instance_name: String,
}

/// Lifecycle state of a platform resource's last operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastOperationState {
    #[serde(alias = "in progress", alias = "in-progress")]
    InProgress,
    Succeeded,
    Failed,
}

impl std::fmt::Display for LastOperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A provisioned resource instance as observed on the platform.
///
/// Created by the platform on request; polled, never mutated by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub guid: Uuid,
    pub name: String,
    pub state: LastOperationState,
}

/// Reference to a service offering in the platform catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingRef {
    pub guid: Uuid,
    pub label: String,
}

/// Reference to a service plan under an offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef {
    pub guid: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_operation_state_parses_platform_spellings() {
        for raw in ["\"in progress\"", "\"in_progress\"", "\"in-progress\""] {
            let state: LastOperationState = serde_json::from_str(raw).unwrap();
            assert_eq!(state, LastOperationState::InProgress);
        }
        let state: LastOperationState = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(state, LastOperationState::Succeeded);
    }
}
