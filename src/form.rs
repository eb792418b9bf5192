//! Form-step builder — binds one step definition and its plugin set to one
//! live user interaction.
//!
//! `build` drives the prompt → wait → validate cycle. Between the prompt and
//! the next user event the engine holds no thread and no step instance; the
//! await on the event source is the engine's single suspension point.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, Notify};

use crate::error::Result;
use crate::event::{EventSource, Prompter, WaitToken};
use crate::plugin::PluginSet;
use crate::session::SessionStore;
use crate::step::FlowStep;

/// Explicit context threaded through every form and plugin operation.
/// Nothing in the engine is reached through ambient state.
pub struct FormContext<'a> {
    /// Stable id of the step being collected; scopes plugin state.
    pub step_id: &'static str,
    /// External identity of the user driving this interaction.
    pub user_id: &'a str,
    pub session: &'a dyn SessionStore,
    pub events: &'a dyn EventSource,
    pub prompter: &'a dyn Prompter,
}

/// Outcome of one form build cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// The step's validator accepted the input; carries the step data.
    Completed(Value),
    /// A skip trigger fired; carries the designated skip value.
    Skipped(Value),
    /// A cancel trigger fired; the whole workflow halts.
    Halted,
}

/// Plugin-set initialization states.
///
/// Initialization is lazy and memoized per runnable instance: the first
/// caller owns it, concurrent callers wait for the in-flight attempt, and a
/// failure leaves the builder retryable instead of stuck half-initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// A runnable step bound to one live interaction.
pub struct FormStep {
    step: Arc<dyn FlowStep>,
    plugins: PluginSet,
    init: Mutex<InitState>,
    init_done: Notify,
}

impl std::fmt::Debug for FormStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormStep")
            .field("step", &self.step.id())
            .finish_non_exhaustive()
    }
}

impl FormStep {
    /// Wire a step definition and its plugins into a runnable unit.
    /// Fails with `DuplicatePlugin` if two plugins share a name.
    pub fn new(step: Arc<dyn FlowStep>) -> Result<Self> {
        let plugins = step.plugins();
        plugins.ensure_unique()?;
        Ok(Self {
            step,
            plugins,
            init: Mutex::new(InitState::Uninitialized),
            init_done: Notify::new(),
        })
    }

    /// Run the prompt → wait → validate cycle until the step resolves.
    ///
    /// Plugin cleanup runs on every exit path out of the cycle — success,
    /// failure, or halt — exactly once.
    pub async fn build(&self, ctx: &FormContext<'_>) -> Result<FormOutcome> {
        self.ensure_initialized(ctx).await?;
        let result = self.run_cycle(ctx).await;
        self.teardown(ctx).await;
        result
    }

    /// Render the current prompt, including any corrective guidance from a
    /// previous failed attempt.
    pub async fn prompt(&self, ctx: &FormContext<'_>, guidance: Option<&str>) -> Result<()> {
        let mut prompt = self.step.prompt(guidance);
        // Surface plugin triggers as choices unless the step already did.
        for plugin in self.plugins.iter() {
            if let Some(trigger) = plugin.trigger() {
                if !prompt.choices.iter().any(|c| c.trigger_id == trigger) {
                    prompt = prompt.with_choice(trigger, trigger);
                }
            }
        }
        ctx.prompter.render(&prompt).await?;
        Ok(())
    }

    /// Validate one raw input with the step's own validator, yielding the
    /// step data on success.
    pub fn validate(&self, raw: &str) -> std::result::Result<Value, crate::error::ValidationError> {
        let instance = self.step.instance(raw);
        instance.validate()?;
        Ok(instance.data())
    }

    async fn run_cycle(&self, ctx: &FormContext<'_>) -> Result<FormOutcome> {
        let mut guidance: Option<String> = None;

        loop {
            self.prompt(ctx, guidance.as_deref()).await?;

            // Suspension point: a fresh token per wait keeps stale replays
            // from cross-talking into this cycle.
            let token = WaitToken::new();
            let event = ctx.events.next_event(token).await?;

            // Plugins see the event before validation, in declared order.
            for plugin in self.plugins.iter() {
                if let Some(outcome) = plugin.on_event(&event, ctx).await? {
                    return Ok(outcome);
                }
            }

            // Fresh instance per attempt, discarded afterwards.
            let instance = self.step.instance(event.raw());
            match instance.validate() {
                Ok(()) => return Ok(FormOutcome::Completed(instance.data())),
                Err(err) => {
                    for plugin in self.plugins.iter() {
                        if let Some(outcome) = plugin.on_invalid(ctx, &err).await? {
                            return Ok(outcome);
                        }
                    }
                    guidance = Some(err.first_message());
                }
            }
        }
    }

    /// Lazily initialize the plugin set exactly once.
    async fn ensure_initialized(&self, ctx: &FormContext<'_>) -> Result<()> {
        loop {
            let mut state = self.init.lock().await;
            match *state {
                InitState::Ready => return Ok(()),
                InitState::Uninitialized | InitState::Failed => {
                    *state = InitState::Initializing;
                    drop(state);

                    let result = self.setup_plugins(ctx).await;
                    *self.init.lock().await = if result.is_ok() {
                        InitState::Ready
                    } else {
                        InitState::Failed
                    };
                    self.init_done.notify_waiters();
                    return result;
                }
                InitState::Initializing => {
                    // Register interest before releasing the lock so the
                    // owner's notify cannot be missed.
                    let notified = self.init_done.notified();
                    drop(state);
                    notified.await;
                }
            }
        }
    }

    async fn setup_plugins(&self, ctx: &FormContext<'_>) -> Result<()> {
        for (idx, plugin) in self.plugins.iter().enumerate() {
            if let Err(err) = plugin.setup(ctx).await {
                // Roll back the plugins that did initialize so a later
                // attempt starts clean.
                for done in self.plugins.iter().take(idx) {
                    if let Err(cleanup_err) = done.cleanup(ctx).await {
                        tracing::warn!(
                            plugin = done.name(),
                            "rollback cleanup failed: {cleanup_err}"
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Release plugin state exactly once and re-arm the builder.
    async fn teardown(&self, ctx: &FormContext<'_>) {
        {
            let mut state = self.init.lock().await;
            if *state != InitState::Ready {
                return;
            }
            *state = InitState::Uninitialized;
        }
        for plugin in self.plugins.iter() {
            if let Err(err) = plugin.cleanup(ctx).await {
                tracing::warn!(plugin = plugin.name(), "plugin cleanup failed: {err}");
            }
        }
    }
}
