//! Birth date step — ISO `YYYY-MM-DD` input.

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};

use crate::error::ValidationError;
use crate::event::PromptRequest;
use crate::plugin::PluginSet;
use crate::step::{FlowStep, StepInstance};

/// Asks for the user's date of birth.
#[derive(Default)]
pub struct BirthDateStep {
    plugins: PluginSet,
}

impl BirthDateStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(mut self, plugins: PluginSet) -> Self {
        self.plugins = plugins;
        self
    }
}

impl FlowStep for BirthDateStep {
    fn id(&self) -> &'static str {
        "birth_date"
    }

    fn prompt(&self, guidance: Option<&str>) -> PromptRequest {
        let mut prompt =
            PromptRequest::new("onboarding.birth_date").with_param("hint", "YYYY-MM-DD");
        if let Some(msg) = guidance {
            prompt = prompt.with_param("guidance", msg);
        }
        prompt
    }

    fn instance(&self, raw: &str) -> Box<dyn StepInstance> {
        Box::new(BirthDateInstance {
            raw: raw.trim().to_string(),
        })
    }

    fn plugins(&self) -> PluginSet {
        self.plugins.clone()
    }
}

#[derive(Debug)]
struct BirthDateInstance {
    raw: String,
}

impl BirthDateInstance {
    fn parse(&self) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(&self.raw, "%Y-%m-%d").map_err(|_| {
            ValidationError::single("birthDate", "expected a date like 1990-06-15 (YYYY-MM-DD)")
        })
    }
}

impl StepInstance for BirthDateInstance {
    fn validate(&self) -> Result<(), ValidationError> {
        let date = self.parse()?;
        if date > Utc::now().date_naive() {
            return Err(ValidationError::single(
                "birthDate",
                "birth date cannot be in the future",
            ));
        }
        Ok(())
    }

    fn data(&self) -> Value {
        json!({ "birthDate": self.raw })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn step() -> BirthDateStep {
        BirthDateStep::new()
    }

    #[test]
    fn accepts_iso_dates() {
        let instance = step().instance("1990-06-15");
        assert!(instance.validate().is_ok());
        assert_eq!(instance.data(), json!({"birthDate": "1990-06-15"}));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let instance = step().instance("  1990-06-15 ");
        assert!(instance.validate().is_ok());
        assert_eq!(instance.data(), json!({"birthDate": "1990-06-15"}));
    }

    #[test]
    fn rejects_malformed_dates() {
        for raw in ["yesterday", "15.06.1990", "1990-13-01", "1990-02-30", ""] {
            let instance = step().instance(raw);
            let err = instance.validate().unwrap_err();
            assert!(err.first_message().contains("YYYY-MM-DD"), "raw: {raw}");
        }
    }

    #[test]
    fn rejects_future_dates() {
        let next_year = Utc::now().date_naive().format("%Y").to_string();
        let future = format!("{}-01-01", next_year.parse::<i32>().unwrap() + 1);
        let instance = step().instance(&future);
        let err = instance.validate().unwrap_err();
        assert!(err.first_message().contains("future"));
    }
}
