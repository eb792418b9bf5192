//! Cancel plugin — a trigger that aborts the whole workflow.

use std::sync::Arc;

use crate::event::InputEvent;
use crate::form::{FormContext, FormOutcome};

/// Side effect run when cancellation fires, with the live form context.
pub type CancelHook = Arc<dyn Fn(&FormContext<'_>) + Send + Sync>;

/// Watches for a trigger identifier and, when it fires, halts the entire
/// enclosing multi-step workflow — not just the current step. The halt
/// travels as [`FormOutcome::Halted`] through each layer's return value.
#[derive(Clone)]
pub struct CancelPlugin {
    trigger: String,
    on_cancel: Option<CancelHook>,
}

impl CancelPlugin {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            on_cancel: None,
        }
    }

    /// Attach a side effect to run exactly once when cancellation fires.
    pub fn with_hook(
        mut self,
        hook: impl Fn(&FormContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.on_cancel = Some(Arc::new(hook));
        self
    }

    /// The trigger identifier this plugin watches for.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub(crate) fn intercept(
        &self,
        event: &InputEvent,
        ctx: &FormContext<'_>,
    ) -> Option<FormOutcome> {
        if event.trigger() != Some(self.trigger.as_str()) {
            return None;
        }
        if let Some(hook) = &self.on_cancel {
            hook(ctx);
        }
        Some(FormOutcome::Halted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::testing::{RecordingPrompter, ScriptedEvents};
    use crate::session::MemorySession;

    fn ctx<'a>(
        session: &'a MemorySession,
        events: &'a ScriptedEvents,
        prompter: &'a RecordingPrompter,
    ) -> FormContext<'a> {
        FormContext {
            step_id: "birth_date",
            user_id: "user-1",
            session,
            events,
            prompter,
        }
    }

    #[test]
    fn non_matching_events_pass_through() {
        let session = MemorySession::new();
        let events = ScriptedEvents::new([]);
        let prompter = RecordingPrompter::default();
        let plugin = CancelPlugin::new("cancel");
        let ctx = ctx(&session, &events, &prompter);

        assert_eq!(plugin.intercept(&InputEvent::Text("cancel".into()), &ctx), None);
        assert_eq!(plugin.intercept(&InputEvent::Trigger("skip".into()), &ctx), None);
    }

    #[test]
    fn matching_trigger_halts_and_runs_hook_once() {
        static FIRED: AtomicUsize = AtomicUsize::new(0);

        let session = MemorySession::new();
        let events = ScriptedEvents::new([]);
        let prompter = RecordingPrompter::default();
        let plugin = CancelPlugin::new("cancel").with_hook(|_ctx| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        let ctx = ctx(&session, &events, &prompter);

        let outcome = plugin.intercept(&InputEvent::Trigger("cancel".into()), &ctx);
        assert_eq!(outcome, Some(FormOutcome::Halted));
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }
}
