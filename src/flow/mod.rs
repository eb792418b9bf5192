//! Workflow orchestrator — ordered steps, current position, accumulated
//! data, and the snapshot/restore contract.
//!
//! The orchestrator exclusively owns its [`WorkflowState`]; position only
//! advances after a step succeeds, and every advance is persisted before the
//! call returns. A crash between a successful validation and the persist is
//! safe: the snapshot still points at the old index, so the same input is
//! simply re-requested on resume.

mod state;

pub use state::{FlowStatus, SNAPSHOT_VERSION, WorkflowState};

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::config::FlowConfig;
use crate::error::{FlowError, Result, SessionError};
use crate::event::{EventSource, Prompter};
use crate::form::{FormContext, FormOutcome, FormStep};
use crate::session::{SessionStore, get_object, set_object};
use crate::step::StepRegistry;

/// Owner-supplied callback invoked once when the workflow completes.
/// An error here is logged and surfaced to the owner's tracing, never left
/// to corrupt the already-completed state.
pub type CompletionHook = Arc<dyn Fn(&WorkflowState) -> anyhow::Result<()> + Send + Sync>;

/// What a single `process` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The step validated; the workflow moved to the next index.
    Advanced,
    /// The final step validated; the workflow is complete.
    Completed,
    /// Validation failed; state is untouched and the same input may be
    /// retried. Carries the user-facing message.
    Rejected { message: String },
}

/// Result of driving the workflow interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// One step finished; more remain.
    Advanced,
    /// Every step finished.
    Completed,
    /// A cancel trigger fired; the workflow was abandoned.
    Halted,
}

/// The multi-step workflow engine.
pub struct Flow {
    registry: StepRegistry,
    session: Arc<dyn SessionStore>,
    config: FlowConfig,
    state: WorkflowState,
    on_complete: Option<CompletionHook>,
}

impl Flow {
    pub fn new(registry: StepRegistry, session: Arc<dyn SessionStore>) -> Self {
        Self::with_config(registry, session, FlowConfig::default())
    }

    pub fn with_config(
        registry: StepRegistry,
        session: Arc<dyn SessionStore>,
        config: FlowConfig,
    ) -> Self {
        Self {
            registry,
            session,
            config,
            state: WorkflowState::default(),
            on_complete: None,
        }
    }

    /// Attach the completion callback, invoked once with the final state.
    pub fn on_complete(
        mut self,
        hook: impl Fn(&WorkflowState) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    /// Build a flow resuming from the snapshot persisted in the session
    /// store, or a fresh one if no snapshot exists.
    pub async fn restore(
        registry: StepRegistry,
        session: Arc<dyn SessionStore>,
        config: FlowConfig,
    ) -> Result<Self> {
        let mut flow = Self::with_config(registry, session, config);
        match get_object::<WorkflowState>(flow.session.as_ref(), &flow.config.snapshot_key).await {
            Ok(snapshot) => flow.set_state(snapshot)?,
            Err(SessionError::KeyNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(flow)
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn total_steps(&self) -> usize {
        self.registry.count()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// Deep copy of the current state for persistence or transfer; mutating
    /// the copy never aliases the orchestrator's own containers.
    pub fn snapshot(&self) -> WorkflowState {
        self.state.clone()
    }

    /// Replace internal state wholesale (resume from a persisted snapshot).
    /// Rejects snapshots written under a different schema version.
    pub fn set_state(&mut self, state: WorkflowState) -> Result<()> {
        if state.version != SNAPSHOT_VERSION {
            return Err(FlowError::SnapshotVersion {
                found: state.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        self.state = state;
        Ok(())
    }

    /// Reinitialize to idle-at-zero and persist immediately.
    pub async fn reset(&mut self) -> Result<()> {
        self.state = WorkflowState::default();
        self.persist().await
    }

    /// Feed one raw input to the step at the current index.
    ///
    /// Validation failure leaves state untouched and is reported in the
    /// outcome, never as an error; an out-of-range call is a contract
    /// violation and fails hard.
    pub async fn process(&mut self, raw: &str) -> Result<ProcessOutcome> {
        if self.state.current_index >= self.registry.count() {
            return Err(FlowError::WorkflowCompleted);
        }

        let instance = self.registry.create(self.state.current_index, raw)?;
        if let Err(err) = instance.validate() {
            return Ok(ProcessOutcome::Rejected {
                message: err.first_message(),
            });
        }
        self.complete_step(instance.data()).await
    }

    /// Record one step's data and advance: append, bump the index, flip the
    /// status, persist, and fire the completion hook on the last step.
    pub async fn complete_step(&mut self, data: Value) -> Result<ProcessOutcome> {
        if self.state.current_index >= self.registry.count() {
            return Err(FlowError::WorkflowCompleted);
        }

        self.state.steps_data.push(data);
        self.state.current_index += 1;

        if self.state.current_index >= self.registry.count() {
            self.state.status = FlowStatus::Completed;
            self.state.completed_at = Some(Utc::now());
            self.persist().await?;
            tracing::info!(steps = self.state.steps_data.len(), "workflow completed");
            self.fire_completion();
            Ok(ProcessOutcome::Completed)
        } else {
            self.state.status = FlowStatus::InProgress;
            self.persist().await?;
            tracing::debug!(index = self.state.current_index, "workflow advanced");
            Ok(ProcessOutcome::Advanced)
        }
    }

    /// Drive the step at the current index through its form: prompt the
    /// user, wait for events, let plugins intercept, validate, and apply
    /// the outcome.
    pub async fn run_step(
        &mut self,
        events: &dyn EventSource,
        prompter: &dyn Prompter,
        user_id: &str,
    ) -> Result<FlowOutcome> {
        if self.state.current_index >= self.registry.count() {
            return Err(FlowError::WorkflowCompleted);
        }

        let step = Arc::clone(self.registry.get(self.state.current_index)?);
        let session = Arc::clone(&self.session);
        let form = FormStep::new(Arc::clone(&step))?;

        let outcome = {
            let ctx = FormContext {
                step_id: step.id(),
                user_id,
                session: session.as_ref(),
                events,
                prompter,
            };
            form.build(&ctx).await?
        };

        match outcome {
            FormOutcome::Completed(value) | FormOutcome::Skipped(value) => {
                match self.complete_step(value).await? {
                    ProcessOutcome::Completed => Ok(FlowOutcome::Completed),
                    _ => Ok(FlowOutcome::Advanced),
                }
            }
            FormOutcome::Halted => {
                tracing::info!(index = self.state.current_index, "workflow halted");
                Ok(FlowOutcome::Halted)
            }
        }
    }

    /// Drive the whole workflow until it completes or halts.
    pub async fn run(
        &mut self,
        events: &dyn EventSource,
        prompter: &dyn Prompter,
        user_id: &str,
    ) -> Result<FlowOutcome> {
        loop {
            match self.run_step(events, prompter, user_id).await? {
                FlowOutcome::Advanced => continue,
                terminal => return Ok(terminal),
            }
        }
    }

    async fn persist(&self) -> Result<()> {
        set_object(self.session.as_ref(), &self.config.snapshot_key, &self.state).await?;
        Ok(())
    }

    fn fire_completion(&self) {
        if let Some(hook) = &self.on_complete {
            if let Err(err) = hook(&self.state) {
                tracing::warn!("completion hook failed: {err:#}");
            }
        }
    }
}
