//! Skip plugin — a trigger that succeeds the step with a designated value.

use serde_json::Value;

use crate::event::InputEvent;
use crate::form::FormOutcome;

/// Watches for a trigger identifier and, when it fires, short-circuits
/// validation: the step succeeds with the designated skip value (null by
/// default) without its validator ever running.
#[derive(Clone)]
pub struct SkipPlugin {
    trigger: String,
    skip_value: Value,
}

impl SkipPlugin {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            skip_value: Value::Null,
        }
    }

    /// Use a value other than null as the skipped step's data.
    pub fn with_value(mut self, value: Value) -> Self {
        self.skip_value = value;
        self
    }

    /// The trigger identifier this plugin watches for.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub(crate) fn intercept(&self, event: &InputEvent) -> Option<FormOutcome> {
        if event.trigger() == Some(self.trigger.as_str()) {
            Some(FormOutcome::Skipped(self.skip_value.clone()))
        } else {
            None
        }
    }
}
