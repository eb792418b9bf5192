//! Workflow state — status, position, and collected step data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version tag of the persisted snapshot schema.
///
/// Bumped whenever the step registry order/count or a step's data shape
/// changes incompatibly, so in-flight snapshots fail loudly instead of
/// silently misaligning with a redeployed registry.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Where the workflow stands. Serialized as `0|1|2` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FlowStatus {
    Idle,
    InProgress,
    Completed,
}

impl From<FlowStatus> for u8 {
    fn from(status: FlowStatus) -> u8 {
        match status {
            FlowStatus::Idle => 0,
            FlowStatus::InProgress => 1,
            FlowStatus::Completed => 2,
        }
    }
}

impl TryFrom<u8> for FlowStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Completed),
            other => Err(format!("invalid workflow status: {other}")),
        }
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// The orchestrator's whole mutable state; everything that must survive a
/// suspension point lives here.
///
/// Invariant: `current_index == steps_data.len()`; when status is
/// `Completed`, `current_index` equals the registry's total step count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Snapshot schema version; see [`SNAPSHOT_VERSION`].
    #[serde(default = "default_version")]
    pub version: u32,
    pub status: FlowStatus,
    pub current_index: usize,
    /// One data fragment per completed step, index-aligned with the registry.
    pub steps_data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            status: FlowStatus::Idle,
            current_index: 0,
            steps_data: Vec::new(),
            completed_at: None,
        }
    }
}

impl WorkflowState {
    pub fn is_completed(&self) -> bool {
        self.status == FlowStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_wire_encoding_is_integer() {
        assert_eq!(serde_json::to_string(&FlowStatus::Idle).unwrap(), "0");
        assert_eq!(serde_json::to_string(&FlowStatus::InProgress).unwrap(), "1");
        assert_eq!(serde_json::to_string(&FlowStatus::Completed).unwrap(), "2");

        let status: FlowStatus = serde_json::from_str("1").unwrap();
        assert_eq!(status, FlowStatus::InProgress);
        assert!(serde_json::from_str::<FlowStatus>("3").is_err());
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let state = WorkflowState {
            status: FlowStatus::InProgress,
            current_index: 1,
            steps_data: vec![json!({"birthDate": "1990-06-15"})],
            ..Default::default()
        };

        let wire = serde_json::to_value(&state).unwrap();
        assert_eq!(wire["status"], 1);
        assert_eq!(wire["currentIndex"], 1);
        assert_eq!(wire["stepsData"][0]["birthDate"], "1990-06-15");
        assert_eq!(wire["version"], SNAPSHOT_VERSION);
        assert!(wire.get("completedAt").is_none());
    }

    #[test]
    fn snapshot_roundtrip() {
        let state = WorkflowState {
            status: FlowStatus::Completed,
            current_index: 3,
            steps_data: vec![
                json!({"birthDate": "1990-06-15"}),
                json!({"birthTime": "14:30"}),
                json!({"lat": 55.75, "lon": 37.61}),
            ],
            completed_at: Some(Utc::now()),
            ..Default::default()
        };

        let json = serde_json::to_string(&state).unwrap();
        let parsed: WorkflowState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn version_defaults_for_legacy_snapshots() {
        // Snapshots written before the version tag existed.
        let legacy = r#"{"status":1,"currentIndex":2,"stepsData":[{},{}]}"#;
        let parsed: WorkflowState = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.version, SNAPSHOT_VERSION);
        assert_eq!(parsed.current_index, 2);
    }

    #[test]
    fn default_state_is_idle_at_zero() {
        let state = WorkflowState::default();
        assert_eq!(state.status, FlowStatus::Idle);
        assert_eq!(state.current_index, 0);
        assert!(state.steps_data.is_empty());
        assert!(!state.is_completed());
    }
}
