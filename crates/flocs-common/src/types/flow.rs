//! FlowRating - self-reported difficulty of a finished task
//!
//! The scale is ordinal and ordered from the worst experience to the best
//! fit for the learner's skill:
//!
//! ```text
//! VeryDifficult (1) < Difficult (2) < Right (3) < Easy (4)
//! ```
//!
//! Predicted flow values live on the same 1..=4 scale, so the prediction
//! error is simply `reported.value() - predicted`.

use serde::{Deserialize, Serialize};

/// Self-reported (or substituted) flow of a task instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowRating {
    /// Learner could not cope with the task
    VeryDifficult,
    /// Learner struggled but managed
    Difficult,
    /// Difficulty matched the learner's skill
    Right,
    /// Task was below the learner's skill
    Easy,
}

impl FlowRating {
    /// Rating substituted when a learner gives up
    pub const WORST: FlowRating = FlowRating::VeryDifficult;

    /// All ratings, worst first
    pub const ALL: [FlowRating; 4] = [
        FlowRating::VeryDifficult,
        FlowRating::Difficult,
        FlowRating::Right,
        FlowRating::Easy,
    ];

    /// Lowest value on the flow scale
    pub const MIN_VALUE: f64 = 1.0;

    /// Highest value on the flow scale
    pub const MAX_VALUE: f64 = 4.0;

    /// Ordinal value on the flow scale
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            FlowRating::VeryDifficult => 1.0,
            FlowRating::Difficult => 2.0,
            FlowRating::Right => 3.0,
            FlowRating::Easy => 4.0,
        }
    }

    /// Nearest rating for a continuous flow value
    pub fn nearest(value: f64) -> FlowRating {
        let clamped = value.clamp(Self::MIN_VALUE, Self::MAX_VALUE);
        Self::ALL
            .into_iter()
            .min_by(|a, b| {
                (a.value() - clamped)
                    .abs()
                    .total_cmp(&(b.value() - clamped).abs())
            })
            .unwrap_or(FlowRating::Right)
    }
}

impl std::fmt::Display for FlowRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowRating::VeryDifficult => write!(f, "very-difficult"),
            FlowRating::Difficult => write!(f, "difficult"),
            FlowRating::Right => write!(f, "right"),
            FlowRating::Easy => write!(f, "easy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_ordered() {
        assert!(FlowRating::VeryDifficult < FlowRating::Difficult);
        assert!(FlowRating::Right < FlowRating::Easy);
        assert_eq!(FlowRating::WORST, FlowRating::ALL[0]);

        let values: Vec<f64> = FlowRating::ALL.iter().map(|r| r.value()).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_nearest_rating() {
        assert_eq!(FlowRating::nearest(0.2), FlowRating::VeryDifficult);
        assert_eq!(FlowRating::nearest(2.9), FlowRating::Right);
        assert_eq!(FlowRating::nearest(9.0), FlowRating::Easy);
    }

    #[test]
    fn test_kebab_case_serialization() {
        let json = serde_json::to_string(&FlowRating::VeryDifficult).unwrap();
        assert_eq!(json, "\"very-difficult\"");
        let parsed: FlowRating = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(parsed, FlowRating::Right);
    }
}
