//! Step abstraction — one unit of the workflow turning one raw input into
//! one validated data fragment.

mod registry;

pub use registry::StepRegistry;

use serde_json::Value;

use crate::error::ValidationError;
use crate::event::PromptRequest;
use crate::plugin::PluginSet;

/// A materialized step attempt.
///
/// Constructed fresh per attempt from the raw input and discarded after
/// `validate` + `data`, regardless of outcome.
pub trait StepInstance: Send + std::fmt::Debug {
    /// Check the raw input against the step's rules.
    fn validate(&self) -> Result<(), ValidationError>;

    /// The typed payload to append to the workflow's collected data.
    /// Only meaningful after `validate` succeeded.
    fn data(&self) -> Value;
}

/// A registry entry: one step definition bound to a fixed index for the
/// lifetime of a workflow run.
pub trait FlowStep: Send + Sync {
    /// Stable identifier; scopes persisted plugin state for this step.
    fn id(&self) -> &'static str;

    /// The prompt asking the user for this step's input. `guidance` carries
    /// the previous attempt's first failure message when re-prompting.
    fn prompt(&self, guidance: Option<&str>) -> PromptRequest;

    /// Materialize a fresh instance from one raw input.
    fn instance(&self, raw: &str) -> Box<dyn StepInstance>;

    /// Plugins attached to this step. Default: none.
    fn plugins(&self) -> PluginSet {
        PluginSet::new()
    }
}
