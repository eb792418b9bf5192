//! Attempts plugin — bounded retry with a persisted counter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError, ValidationError};
use crate::form::{FormContext, FormOutcome};
use crate::session::{get_object, session_keys, set_object};

/// Fallback invoked when the attempt limit is reached. Its result — a
/// success value, a skip, a halt, or a propagated error — becomes the
/// step's outcome instead of another retry.
pub type LimitHook = Arc<dyn Fn(&FormContext<'_>) -> Result<FormOutcome> + Send + Sync>;

/// Persisted plugin-local state, tagged with the owning step id.
///
/// A record found under the key but tagged with a different step id is
/// stale and treated as absent, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    pub step_id: String,
    pub attempts: u32,
}

/// Tracks consecutive failed validations for one step in the session store
/// and hands control to `on_limit_reached` when the limit is hit.
#[derive(Clone)]
pub struct AttemptsPlugin {
    max_attempts: u32,
    on_limit_reached: LimitHook,
}

impl AttemptsPlugin {
    pub fn new(
        max_attempts: u32,
        on_limit_reached: impl Fn(&FormContext<'_>) -> Result<FormOutcome> + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_attempts,
            on_limit_reached: Arc::new(on_limit_reached),
        }
    }

    fn state_key(&self, ctx: &FormContext<'_>) -> String {
        session_keys::plugin_state(ctx.step_id, "attempts")
    }

    async fn load(&self, ctx: &FormContext<'_>) -> Result<u32> {
        match get_object::<AttemptState>(ctx.session, &self.state_key(ctx)).await {
            Ok(state) if state.step_id == ctx.step_id => Ok(state.attempts),
            // Stale state from a different step: treat as absent.
            Ok(_) => Ok(0),
            Err(SessionError::KeyNotFound { .. }) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Purge a stale record left behind by a different step.
    pub(crate) async fn setup(&self, ctx: &FormContext<'_>) -> Result<()> {
        let key = self.state_key(ctx);
        match get_object::<AttemptState>(ctx.session, &key).await {
            Ok(state) if state.step_id != ctx.step_id => {
                tracing::debug!(
                    step_id = ctx.step_id,
                    stale = %state.step_id,
                    "discarding stale attempt counter"
                );
                ctx.session.remove(&key).await?;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(SessionError::KeyNotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn on_invalid(
        &self,
        ctx: &FormContext<'_>,
        _error: &ValidationError,
    ) -> Result<Option<FormOutcome>> {
        let attempts = self.load(ctx).await? + 1;
        let key = self.state_key(ctx);

        if attempts >= self.max_attempts {
            // Clear the counter before the fallback decides the outcome, so
            // a later re-entry of this step starts fresh.
            ctx.session.remove(&key).await?;
            let outcome = (self.on_limit_reached)(ctx)?;
            return Ok(Some(outcome));
        }

        set_object(
            ctx.session,
            &key,
            &AttemptState {
                step_id: ctx.step_id.to_string(),
                attempts,
            },
        )
        .await?;
        Ok(None)
    }

    pub(crate) async fn cleanup(&self, ctx: &FormContext<'_>) -> Result<()> {
        ctx.session.remove(&self.state_key(ctx)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::error::ValidationError;
    use crate::event::testing::{RecordingPrompter, ScriptedEvents};
    use crate::session::{MemorySession, SessionStore};

    fn failing() -> ValidationError {
        ValidationError::single("birthTime", "expected HH:MM")
    }

    struct Fixture {
        session: MemorySession,
        events: ScriptedEvents,
        prompter: RecordingPrompter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                session: MemorySession::new(),
                events: ScriptedEvents::new([]),
                prompter: RecordingPrompter::default(),
            }
        }

        fn ctx(&self, step_id: &'static str) -> FormContext<'_> {
            FormContext {
                step_id,
                user_id: "user-1",
                session: &self.session,
                events: &self.events,
                prompter: &self.prompter,
            }
        }
    }

    #[tokio::test]
    async fn fallback_fires_exactly_on_the_limit() {
        let fx = Fixture::new();
        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(3, |_ctx| Ok(FormOutcome::Skipped(Value::Null)));

        assert_eq!(plugin.on_invalid(&ctx, &failing()).await.unwrap(), None);
        assert_eq!(plugin.on_invalid(&ctx, &failing()).await.unwrap(), None);
        assert_eq!(
            plugin.on_invalid(&ctx, &failing()).await.unwrap(),
            Some(FormOutcome::Skipped(Value::Null))
        );

        // Counter cleared: the key is gone after the limit fired.
        let key = session_keys::plugin_state("birth_time", "attempts");
        assert!(!fx.session.has(&key).await.unwrap());
    }

    #[tokio::test]
    async fn counter_survives_between_calls_through_the_store() {
        let fx = Fixture::new();
        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(3, |_ctx| Ok(FormOutcome::Halted));

        plugin.on_invalid(&ctx, &failing()).await.unwrap();
        let key = session_keys::plugin_state("birth_time", "attempts");
        let state: AttemptState = get_object(&fx.session, &key).await.unwrap();
        assert_eq!(state.attempts, 1);
        assert_eq!(state.step_id, "birth_time");
    }

    #[tokio::test]
    async fn stale_state_from_another_step_is_treated_as_absent() {
        let fx = Fixture::new();
        let key = session_keys::plugin_state("birth_time", "attempts");
        // Stale record under this step's key but tagged with another step.
        set_object(
            &fx.session,
            &key,
            &AttemptState {
                step_id: "birth_date".into(),
                attempts: 2,
            },
        )
        .await
        .unwrap();

        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(3, |_ctx| Ok(FormOutcome::Halted));

        // Counting restarts from zero, so the limit does not fire.
        assert_eq!(plugin.on_invalid(&ctx, &failing()).await.unwrap(), None);
        let state: AttemptState = get_object(&fx.session, &key).await.unwrap();
        assert_eq!(state.attempts, 1);
        assert_eq!(state.step_id, "birth_time");
    }

    #[tokio::test]
    async fn setup_purges_mismatched_records() {
        let fx = Fixture::new();
        let key = session_keys::plugin_state("birth_time", "attempts");
        set_object(
            &fx.session,
            &key,
            &AttemptState {
                step_id: "birth_date".into(),
                attempts: 2,
            },
        )
        .await
        .unwrap();

        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(3, |_ctx| Ok(FormOutcome::Halted));
        plugin.setup(&ctx).await.unwrap();
        assert!(!fx.session.has(&key).await.unwrap());
    }

    #[tokio::test]
    async fn cleanup_removes_the_counter() {
        let fx = Fixture::new();
        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(3, |_ctx| Ok(FormOutcome::Halted));

        plugin.on_invalid(&ctx, &failing()).await.unwrap();
        plugin.cleanup(&ctx).await.unwrap();

        let key = session_keys::plugin_state("birth_time", "attempts");
        assert!(!fx.session.has(&key).await.unwrap());
    }

    #[tokio::test]
    async fn fallback_error_propagates() {
        let fx = Fixture::new();
        let ctx = fx.ctx("birth_time");
        let plugin = AttemptsPlugin::new(1, |_ctx| {
            Err(crate::error::FlowError::Plugin {
                name: "attempts",
                reason: "no fallback available".into(),
            })
        });

        let err = plugin.on_invalid(&ctx, &failing()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::FlowError::Plugin { name: "attempts", .. }
        ));
    }
}
