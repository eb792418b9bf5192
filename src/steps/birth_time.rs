//! Birth time step — 24-hour `HH:MM` input.

use chrono::NaiveTime;
use serde_json::{Value, json};

use crate::error::ValidationError;
use crate::event::PromptRequest;
use crate::plugin::PluginSet;
use crate::step::{FlowStep, StepInstance};

/// Asks for the user's time of birth. Commonly wired with a skip plugin,
/// since many users don't know it.
#[derive(Default)]
pub struct BirthTimeStep {
    plugins: PluginSet,
}

impl BirthTimeStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(mut self, plugins: PluginSet) -> Self {
        self.plugins = plugins;
        self
    }
}

impl FlowStep for BirthTimeStep {
    fn id(&self) -> &'static str {
        "birth_time"
    }

    fn prompt(&self, guidance: Option<&str>) -> PromptRequest {
        let mut prompt = PromptRequest::new("onboarding.birth_time").with_param("hint", "HH:MM");
        if let Some(msg) = guidance {
            prompt = prompt.with_param("guidance", msg);
        }
        prompt
    }

    fn instance(&self, raw: &str) -> Box<dyn StepInstance> {
        Box::new(BirthTimeInstance {
            raw: raw.trim().to_string(),
        })
    }

    fn plugins(&self) -> PluginSet {
        self.plugins.clone()
    }
}

#[derive(Debug)]
struct BirthTimeInstance {
    raw: String,
}

impl StepInstance for BirthTimeInstance {
    fn validate(&self) -> Result<(), ValidationError> {
        NaiveTime::parse_from_str(&self.raw, "%H:%M")
            .map(|_| ())
            .map_err(|_| {
                ValidationError::single("birthTime", "expected a time like 14:30 (HH:MM)")
            })
    }

    fn data(&self) -> Value {
        json!({ "birthTime": self.raw })
    }
}
