//! Interface boundary for user events and prompts.
//!
//! The engine never parses transport envelopes: callers extract raw text or
//! a discrete trigger identifier before handing an event in, and prompt
//! rendering is delegated to the external presentation layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EventError;

/// Correlation key for one suspension point.
///
/// Each wait inside the form build loop carries a fresh token so replayed or
/// duplicate events belonging to a stale wait can be told apart from the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitToken(Uuid);

impl WaitToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WaitToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WaitToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One opaque user-originated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Free-text input.
    Text(String),
    /// A discrete trigger identifier (e.g. an inline button payload).
    Trigger(String),
}

impl InputEvent {
    /// The trigger identifier, if this event is a trigger.
    pub fn trigger(&self) -> Option<&str> {
        match self {
            Self::Trigger(id) => Some(id),
            Self::Text(_) => None,
        }
    }

    /// The raw payload, regardless of kind.
    pub fn raw(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Trigger(id) => id,
        }
    }
}

/// A choice offered alongside a prompt: a label plus the trigger it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub trigger_id: String,
}

/// An abstract "render message with optional choice-set" request.
///
/// The core supplies only a text key, parameters, and choices; how those
/// become a message on a concrete transport is the presentation layer's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptRequest {
    pub text_key: String,
    pub params: serde_json::Map<String, serde_json::Value>,
    pub choices: Vec<Choice>,
}

impl PromptRequest {
    pub fn new(text_key: impl Into<String>) -> Self {
        Self {
            text_key: text_key.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_choice(mut self, label: impl Into<String>, trigger_id: impl Into<String>) -> Self {
        self.choices.push(Choice {
            label: label.into(),
            trigger_id: trigger_id.into(),
        });
        self
    }
}

/// Source of inbound user events. The single suspension point of the engine
/// is an await on [`EventSource::next_event`].
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Wait for the next user event for the wait identified by `token`.
    async fn next_event(&self, token: WaitToken) -> Result<InputEvent, EventError>;
}

/// Outbound prompt renderer.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn render(&self, prompt: &PromptRequest) -> Result<(), EventError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted event/prompt doubles shared by the unit tests.

    use std::collections::VecDeque;

    use tokio::sync::Mutex;

    use super::*;

    /// An event source that replays a fixed script, then reports closed.
    pub struct ScriptedEvents {
        events: Mutex<VecDeque<InputEvent>>,
    }

    impl ScriptedEvents {
        pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
            Self {
                events: Mutex::new(events.into_iter().collect()),
            }
        }

        pub fn text(s: &str) -> InputEvent {
            InputEvent::Text(s.to_string())
        }

        pub fn trigger(s: &str) -> InputEvent {
            InputEvent::Trigger(s.to_string())
        }
    }

    #[async_trait]
    impl EventSource for ScriptedEvents {
        async fn next_event(&self, _token: WaitToken) -> Result<InputEvent, EventError> {
            self.events
                .lock()
                .await
                .pop_front()
                .ok_or(EventError::Closed)
        }
    }

    /// A prompter that records every rendered prompt.
    #[derive(Default)]
    pub struct RecordingPrompter {
        pub prompts: Mutex<Vec<PromptRequest>>,
    }

    #[async_trait]
    impl Prompter for RecordingPrompter {
        async fn render(&self, prompt: &PromptRequest) -> Result<(), EventError> {
            self.prompts.lock().await.push(prompt.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_accessor_distinguishes_kinds() {
        let text = InputEvent::Text("1990-06-15".into());
        let button = InputEvent::Trigger("skip".into());
        assert_eq!(text.trigger(), None);
        assert_eq!(button.trigger(), Some("skip"));
        assert_eq!(text.raw(), "1990-06-15");
        assert_eq!(button.raw(), "skip");
    }

    #[test]
    fn prompt_builder_accumulates_params_and_choices() {
        let prompt = PromptRequest::new("onboarding.birth_time")
            .with_param("hint", "HH:MM")
            .with_choice("Skip", "skip")
            .with_choice("Cancel", "cancel");
        assert_eq!(prompt.text_key, "onboarding.birth_time");
        assert_eq!(prompt.params["hint"], "HH:MM");
        assert_eq!(prompt.choices.len(), 2);
        assert_eq!(prompt.choices[1].trigger_id, "cancel");
    }

    #[test]
    fn wait_tokens_are_unique_per_wait() {
        assert_ne!(WaitToken::new(), WaitToken::new());
    }
}
