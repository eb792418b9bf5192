//! Error types for the intake engine.

/// A single failed validation rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldFailure {
    /// Field the rule applies to, e.g. `"birthDate"`.
    pub field: String,
    /// Human-readable constraint message for the user.
    pub message: String,
}

/// Recoverable validation failure for one step attempt.
///
/// Never escapes the engine as a hard error: the orchestrator surfaces the
/// first failure's message and the same step is simply retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub failures: Vec<FieldFailure>,
}

impl ValidationError {
    /// A validation error with a single field-level failure.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failures: vec![FieldFailure {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// The first failing rule's message, or a generic fallback.
    pub fn first_message(&self) -> String {
        self.failures
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "validation error".to_string())
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first_message())
    }
}

impl std::error::Error for ValidationError {}

/// Session State Contract errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Type mismatch for key {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Event source / prompt rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event source closed")]
    Closed,

    #[error("Failed to render prompt: {0}")]
    Render(String),
}

/// Top-level error type for the workflow engine.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Workflow already completed")]
    WorkflowCompleted,

    #[error("No step registered at index {index} (total {total})")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Duplicate plugin name: {name}")]
    DuplicatePlugin { name: &'static str },

    #[error("Snapshot version mismatch: found {found}, expected {expected}")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("Plugin {name} failed: {reason}")]
    Plugin { name: &'static str, reason: String },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_picks_first_failure() {
        let err = ValidationError {
            failures: vec![
                FieldFailure {
                    field: "birthDate".into(),
                    message: "expected an ISO date".into(),
                },
                FieldFailure {
                    field: "birthDate".into(),
                    message: "date is in the future".into(),
                },
            ],
        };
        assert_eq!(err.first_message(), "expected an ISO date");
        assert_eq!(err.to_string(), "expected an ISO date");
    }

    #[test]
    fn empty_failure_list_falls_back_to_generic_message() {
        let err = ValidationError { failures: vec![] };
        assert_eq!(err.first_message(), "validation error");
    }

    #[test]
    fn session_error_converts_into_flow_error() {
        let err: FlowError = SessionError::KeyNotFound {
            key: "workflow_state".into(),
        }
        .into();
        assert!(matches!(err, FlowError::Session(_)));
        assert!(err.to_string().contains("workflow_state"));
    }
}
