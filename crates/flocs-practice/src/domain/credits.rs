//! Credits for first-time solves
//!
//! Harder tasks are worth more. Credits are the base amount plus one for
//! every configured threshold the task difficulty reaches.

use flocs_common::{FlocsError, Result, MAX_PARAMETER, MIN_PARAMETER};

use crate::config::CreditSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct CreditCalculator {
    base_credits: u32,
    /// Sorted ascending
    thresholds: Vec<f64>,
}

impl CreditCalculator {
    /// Build from settings, rejecting thresholds that are not sorted finite values
    pub fn try_new(settings: &CreditSettings) -> Result<Self> {
        if let Some(bad) = settings.thresholds.iter().find(|t| !t.is_finite()) {
            return Err(FlocsError::InvalidArgument(format!(
                "credit threshold {bad} is not a finite number"
            )));
        }
        if settings.thresholds.windows(2).any(|w| w[0] > w[1]) {
            return Err(FlocsError::InvalidArgument(format!(
                "credit thresholds must be sorted ascending, got {:?}",
                settings.thresholds
            )));
        }
        Ok(Self {
            base_credits: settings.base_credits,
            thresholds: settings.thresholds.clone(),
        })
    }

    /// Credits for solving a task of `difficulty` for the first time
    pub fn difficulty_to_credits(&self, difficulty: f64) -> Result<u32> {
        if !(MIN_PARAMETER..=MAX_PARAMETER).contains(&difficulty) {
            return Err(FlocsError::DomainRange {
                operand: "difficulty",
                value: difficulty,
                min: MIN_PARAMETER,
                max: MAX_PARAMETER,
            });
        }
        let reached = self.thresholds.partition_point(|t| *t <= difficulty);
        Ok(self.base_credits + reached as u32)
    }
}

impl Default for CreditCalculator {
    fn default() -> Self {
        let settings = CreditSettings::default();
        Self {
            base_credits: settings.base_credits,
            thresholds: settings.thresholds,
        }
    }
}
