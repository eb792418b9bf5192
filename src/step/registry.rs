//! Ordered, fixed-length step registry.

use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::step::{FlowStep, StepInstance};

/// Maps zero-based indices to step definitions. Read-only after
/// construction: no dynamic registration at runtime.
pub struct StepRegistry {
    steps: Vec<Arc<dyn FlowStep>>,
}

impl StepRegistry {
    pub fn new(steps: Vec<Arc<dyn FlowStep>>) -> Self {
        Self { steps }
    }

    /// Total number of steps.
    pub fn count(&self) -> usize {
        self.steps.len()
    }

    /// The step definition at `index`.
    pub fn get(&self, index: usize) -> Result<&Arc<dyn FlowStep>> {
        self.steps.get(index).ok_or(FlowError::IndexOutOfRange {
            index,
            total: self.steps.len(),
        })
    }

    /// Materialize the step at `index` from one raw input.
    pub fn create(&self, index: usize, raw: &str) -> Result<Box<dyn StepInstance>> {
        Ok(self.get(index)?.instance(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{BirthDateStep, BirthTimeStep};

    fn registry() -> StepRegistry {
        StepRegistry::new(vec![
            Arc::new(BirthDateStep::new()),
            Arc::new(BirthTimeStep::new()),
        ])
    }

    #[test]
    fn count_matches_registered_steps() {
        assert_eq!(registry().count(), 2);
    }

    #[test]
    fn create_out_of_range_fails() {
        let err = registry().create(2, "anything").unwrap_err();
        assert!(matches!(
            err,
            FlowError::IndexOutOfRange { index: 2, total: 2 }
        ));
    }

    #[test]
    fn create_materializes_a_fresh_instance() {
        let reg = registry();
        let instance = reg.create(0, "1990-06-15").unwrap();
        assert!(instance.validate().is_ok());
        let again = reg.create(0, "not-a-date").unwrap();
        assert!(again.validate().is_err());
    }
}
