//! Cross-cutting step plugins: cancel, skip, and bounded retry.
//!
//! Plugins form a closed set — one enum variant per kind, resolved at
//! compile time instead of through a name-indexed runtime lookup. Each
//! plugin may intercept the incoming event before validation, react to a
//! failed validation, and hold per-step state in the session store that is
//! released on cleanup.

mod attempts;
mod cancel;
mod skip;

pub use attempts::{AttemptState, AttemptsPlugin, LimitHook};
pub use cancel::{CancelHook, CancelPlugin};
pub use skip::SkipPlugin;

use crate::error::{FlowError, Result, ValidationError};
use crate::event::InputEvent;
use crate::form::{FormContext, FormOutcome};

/// A capability attached to a step.
#[derive(Clone)]
pub enum Plugin {
    /// Abort the whole workflow on a matching trigger.
    Cancel(CancelPlugin),
    /// Succeed with a designated value on a matching trigger, bypassing the
    /// step's validator.
    Skip(SkipPlugin),
    /// Bound the number of failed attempts, then invoke a fallback.
    Attempts(AttemptsPlugin),
}

impl Plugin {
    /// Stable plugin name; unique within one step's plugin set.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cancel(_) => "cancel",
            Self::Skip(_) => "skip",
            Self::Attempts(_) => "attempts",
        }
    }

    /// The trigger identifier this plugin watches for, if any.
    pub fn trigger(&self) -> Option<&str> {
        match self {
            Self::Cancel(p) => Some(p.trigger()),
            Self::Skip(p) => Some(p.trigger()),
            Self::Attempts(_) => None,
        }
    }

    /// One-time setup when the form initializes its plugin set.
    pub(crate) async fn setup(&self, ctx: &FormContext<'_>) -> Result<()> {
        match self {
            Self::Attempts(p) => p.setup(ctx).await,
            Self::Cancel(_) | Self::Skip(_) => Ok(()),
        }
    }

    /// Inspect an incoming event before validation runs.
    /// `Some(outcome)` short-circuits the step.
    pub(crate) async fn on_event(
        &self,
        event: &InputEvent,
        ctx: &FormContext<'_>,
    ) -> Result<Option<FormOutcome>> {
        match self {
            Self::Cancel(p) => Ok(p.intercept(event, ctx)),
            Self::Skip(p) => Ok(p.intercept(event)),
            Self::Attempts(_) => Ok(None),
        }
    }

    /// React to a failed validation. `Some(outcome)` ends the retry loop.
    pub(crate) async fn on_invalid(
        &self,
        ctx: &FormContext<'_>,
        error: &ValidationError,
    ) -> Result<Option<FormOutcome>> {
        match self {
            Self::Attempts(p) => p.on_invalid(ctx, error).await,
            Self::Cancel(_) | Self::Skip(_) => Ok(None),
        }
    }

    /// Release per-step state. The form guarantees this runs exactly once on
    /// every exit path.
    pub(crate) async fn cleanup(&self, ctx: &FormContext<'_>) -> Result<()> {
        match self {
            Self::Attempts(p) => p.cleanup(ctx).await,
            Self::Cancel(_) | Self::Skip(_) => Ok(()),
        }
    }
}

/// The ordered plugin set attached to one step.
#[derive(Clone, Default)]
pub struct PluginSet {
    plugins: Vec<Plugin>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. Name uniqueness is enforced when the set is bound
    /// to a runnable form.
    pub fn with(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    /// Fail with `DuplicatePlugin` if two plugins share a name.
    pub(crate) fn ensure_unique(&self) -> Result<()> {
        for (i, plugin) in self.plugins.iter().enumerate() {
            if self.plugins[..i].iter().any(|p| p.name() == plugin.name()) {
                return Err(FlowError::DuplicatePlugin {
                    name: plugin.name(),
                });
            }
        }
        Ok(())
    }
}
