//! Birth place step — decimal `lat,lon` coordinates.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::error::ValidationError;
use crate::event::PromptRequest;
use crate::plugin::PluginSet;
use crate::step::{FlowStep, StepInstance};

static COORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*$").expect("valid coords regex")
});

/// Asks for the user's place of birth as `latitude,longitude`.
#[derive(Default)]
pub struct BirthPlaceStep {
    plugins: PluginSet,
}

impl BirthPlaceStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(mut self, plugins: PluginSet) -> Self {
        self.plugins = plugins;
        self
    }
}

impl FlowStep for BirthPlaceStep {
    fn id(&self) -> &'static str {
        "birth_place"
    }

    fn prompt(&self, guidance: Option<&str>) -> PromptRequest {
        let mut prompt =
            PromptRequest::new("onboarding.birth_place").with_param("hint", "lat,lon");
        if let Some(msg) = guidance {
            prompt = prompt.with_param("guidance", msg);
        }
        prompt
    }

    fn instance(&self, raw: &str) -> Box<dyn StepInstance> {
        Box::new(BirthPlaceInstance {
            raw: raw.to_string(),
        })
    }

    fn plugins(&self) -> PluginSet {
        self.plugins.clone()
    }
}

#[derive(Debug)]
struct BirthPlaceInstance {
    raw: String,
}

impl BirthPlaceInstance {
    fn parse(&self) -> Result<(f64, f64), ValidationError> {
        let caps = COORDS.captures(&self.raw).ok_or_else(|| {
            ValidationError::single(
                "coordinates",
                "expected coordinates like 55.75,37.61 (lat,lon)",
            )
        })?;
        // Both captures matched the numeric pattern, so parsing can't fail.
        let lat: f64 = caps[1].parse().unwrap_or_default();
        let lon: f64 = caps[2].parse().unwrap_or_default();

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::single(
                "lat",
                "latitude must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::single(
                "lon",
                "longitude must be between -180 and 180",
            ));
        }
        Ok((lat, lon))
    }
}

impl StepInstance for BirthPlaceInstance {
    fn validate(&self) -> Result<(), ValidationError> {
        self.parse().map(|_| ())
    }

    fn data(&self) -> Value {
        match self.parse() {
            Ok((lat, lon)) => json!({ "lat": lat, "lon": lon }),
            // Unreachable after a successful validate; keep the contract
            // total anyway.
            Err(_) => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn step() -> BirthPlaceStep {
        BirthPlaceStep::new()
    }

    #[test]
    fn accepts_decimal_coordinates() {
        let instance = step().instance("55.75,37.61");
        assert!(instance.validate().is_ok());
        assert_eq!(instance.data(), json!({"lat": 55.75, "lon": 37.61}));
    }

    #[test]
    fn accepts_negatives_and_spacing() {
        let instance = step().instance(" -33.87 , 151.21 ");
        assert!(instance.validate().is_ok());
        assert_eq!(instance.data(), json!({"lat": -33.87, "lon": 151.21}));
    }

    #[test]
    fn rejects_malformed_coordinates() {
        for raw in ["Moscow", "55.75", "55.75;37.61", "", "lat,lon"] {
            let instance = step().instance(raw);
            assert!(instance.validate().is_err(), "raw: {raw}");
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let lat_err = step().instance("91,0").validate().unwrap_err();
        assert!(lat_err.first_message().contains("latitude"));

        let lon_err = step().instance("0,181").validate().unwrap_err();
        assert!(lon_err.first_message().contains("longitude"));
    }
}
