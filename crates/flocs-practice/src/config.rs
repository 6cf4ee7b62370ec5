//! Practice engine configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file
//! (`FLOCS_CONFIG`, default `flocs.toml`), then `FLOCS__SECTION__KEY`
//! environment variables.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use flocs_common::{FlowRating, MAX_PARAMETER, MIN_PARAMETER};

use crate::domain::context::CommitMode;

/// Longest accepted session inactivity timeout (one week)
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

/// Practice engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Flow model settings
    pub model: ModelSettings,
    /// Task selection weights
    pub selection: SelectionSettings,
    /// Credit awarding
    pub credits: CreditSettings,
    /// Practice sessions
    pub session: SessionSettings,
    /// Parameter persistence
    pub storage: StorageSettings,
}

impl PracticeConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let path = std::env::var("FLOCS_CONFIG").unwrap_or_else(|_| "flocs".to_string());
        // Missing keys fall back to the serde defaults
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("FLOCS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to assemble configuration (file: {path})"))?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration from TOML text layered over the defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        ensure!(
            model.learning_rate > 0.0,
            "model.learning_rate must be positive, got {}",
            model.learning_rate
        );
        ensure!(
            model.max_step > 0.0,
            "model.max_step must be positive, got {}",
            model.max_step
        );
        ensure!(
            model.task_rate_ratio >= 0.0,
            "model.task_rate_ratio must not be negative, got {}",
            model.task_rate_ratio
        );

        let selection = &self.selection;
        ensure!(
            (FlowRating::MIN_VALUE..=FlowRating::MAX_VALUE).contains(&selection.target_flow),
            "selection.target_flow must lie on the flow scale [{}, {}], got {}",
            FlowRating::MIN_VALUE,
            FlowRating::MAX_VALUE,
            selection.target_flow
        );
        ensure!(
            selection.recency_horizon > 0,
            "selection.recency_horizon must be positive"
        );

        let thresholds = &self.credits.thresholds;
        ensure!(
            thresholds.iter().all(|t| t.is_finite()),
            "credits.thresholds must be finite numbers"
        );
        ensure!(
            thresholds.windows(2).all(|w| w[0] <= w[1]),
            "credits.thresholds must be sorted ascending, got {:?}",
            thresholds
        );
        ensure!(
            thresholds
                .iter()
                .all(|t| (MIN_PARAMETER..=MAX_PARAMETER).contains(t)),
            "credits.thresholds must lie in [{}, {}]",
            MIN_PARAMETER,
            MAX_PARAMETER
        );

        ensure!(
            (1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&self.session.timeout_minutes),
            "session.timeout_minutes must lie in [1, {}], got {}",
            MAX_SESSION_TIMEOUT_MINUTES,
            self.session.timeout_minutes
        );
        Ok(())
    }
}

/// Flow model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Fraction of the prediction error applied per flow report
    pub learning_rate: f64,
    /// Upper bound on a single skill/difficulty adjustment
    pub max_step: f64,
    /// Task difficulty moves by `step * task_rate_ratio`
    pub task_rate_ratio: f64,
    /// Weight of past solutions (log-scaled) in the flow prediction
    pub practice_weight: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            learning_rate: crate::DEFAULT_LEARNING_RATE,
            max_step: crate::DEFAULT_MAX_STEP,
            task_rate_ratio: 0.5,
            practice_weight: 0.5,
        }
    }
}

/// Task selection weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Ideal predicted flow
    pub target_flow: f64,
    /// Penalty per unit of distance from the target flow
    pub flow_weight: f64,
    /// Penalty per past solution of the task
    pub solved_weight: f64,
    /// Solutions beyond this count are not penalized further
    pub solved_cap: u32,
    /// Bonus for tasks not assigned recently
    pub recency_weight: f64,
    /// Number of assignments after which a task counts as fresh again
    pub recency_horizon: u32,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            target_flow: crate::DEFAULT_TARGET_FLOW,
            flow_weight: 1.0,
            solved_weight: 0.3,
            solved_cap: 3,
            recency_weight: 0.5,
            recency_horizon: 10,
        }
    }
}

/// Credit awarding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditSettings {
    /// Credits for the easiest first-time solve
    pub base_credits: u32,
    /// Each threshold at or below the difficulty adds one credit
    pub thresholds: Vec<f64>,
}

impl Default for CreditSettings {
    fn default() -> Self {
        Self {
            base_credits: 1,
            thresholds: vec![0.0, 1.0, 2.0, 3.0],
        }
    }
}

/// Practice session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Inactivity after which the next task opens a new session
    pub timeout_minutes: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_minutes: crate::DEFAULT_SESSION_TIMEOUT_MINUTES,
        }
    }
}

/// Parameter persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// How a practice context commits its changes
    pub commit_mode: CommitMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PracticeConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.credits.thresholds, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(cfg.storage.commit_mode, CommitMode::Overwrite);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let cfg = PracticeConfig::from_toml(
            r#"
            [model]
            learning_rate = 0.25

            [storage]
            commit_mode = "delta"
            "#,
        )
        .unwrap();

        assert!((cfg.model.learning_rate - 0.25).abs() < f64::EPSILON);
        assert!((cfg.model.max_step - crate::DEFAULT_MAX_STEP).abs() < f64::EPSILON);
        assert_eq!(cfg.storage.commit_mode, CommitMode::Delta);
        assert_eq!(cfg.selection.recency_horizon, 10);
    }

    #[test]
    fn test_unsorted_thresholds_rejected() {
        let err = PracticeConfig::from_toml(
            r#"
            [credits]
            thresholds = [1.0, 0.0]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sorted"));
    }

    #[test]
    fn test_session_timeout_bounded() {
        let mut cfg = PracticeConfig::default();
        cfg.session.timeout_minutes = i64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("session.timeout_minutes"));

        cfg.session.timeout_minutes = MAX_SESSION_TIMEOUT_MINUTES;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_target_flow_must_be_on_scale() {
        let mut cfg = PracticeConfig::default();
        cfg.selection.target_flow = 7.0;
        assert!(cfg.validate().is_err());
    }
}
