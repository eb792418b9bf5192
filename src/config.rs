//! Configuration types.

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Session key under which the workflow snapshot is persisted.
    pub snapshot_key: String,
    /// Default attempt limit for steps that enable bounded retry.
    pub max_attempts: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            snapshot_key: crate::session::session_keys::WORKFLOW_STATE.to_string(),
            max_attempts: 3,
        }
    }
}
