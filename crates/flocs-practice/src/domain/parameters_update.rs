//! Parameter updates from flow reports
//!
//! The prediction error moves learner skill and task difficulty in opposite
//! directions. A report easier than predicted raises the skill and lowers the
//! difficulty, so the next prediction for the pair is higher.

use tracing::debug;

use flocs_common::{Factor, FlowRating, LearnerId, Result, TaskId, MAX_PARAMETER, MIN_PARAMETER};

use crate::config::ModelSettings;
use crate::domain::context::PracticeContext;

/// Bounded correction of skill and difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterUpdater {
    learning_rate: f64,
    max_step: f64,
    task_rate_ratio: f64,
}

/// Changes applied by one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterShift {
    pub error: f64,
    pub skill: f64,
    pub difficulty: f64,
}

impl ParameterUpdater {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            learning_rate: settings.learning_rate,
            max_step: settings.max_step,
            task_rate_ratio: settings.task_rate_ratio,
        }
    }

    /// Skill step for a prediction error, at most `max_step` either way
    pub fn step(&self, error: f64) -> f64 {
        (self.learning_rate * error).clamp(-self.max_step, self.max_step)
    }

    /// Apply the correction for one flow report to the context
    ///
    /// The context is left unsaved.
    pub fn update_parameters(
        &self,
        ctx: &mut PracticeContext,
        learner: LearnerId,
        task: TaskId,
        reported: FlowRating,
        predicted: f64,
    ) -> Result<ParameterShift> {
        let error = reported.value() - predicted;
        let step = self.step(error);
        let task_step = step * self.task_rate_ratio;

        let skill = ctx.update(Factor::StudentBias, None, |skill| {
            (skill + step).clamp(MIN_PARAMETER, MAX_PARAMETER)
        })?;
        let difficulty = ctx.update(Factor::TaskBias, Some(task), |difficulty| {
            (difficulty - task_step).clamp(MIN_PARAMETER, MAX_PARAMETER)
        })?;

        debug!(%learner, %task, %reported, predicted, error, skill, difficulty, "Updated parameters");
        Ok(ParameterShift {
            error,
            skill,
            difficulty,
        })
    }
}

impl Default for ParameterUpdater {
    fn default() -> Self {
        Self::new(&ModelSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::CommitMode;
    use crate::domain::prediction::FlowPredictor;
    use crate::infra::parameter_store::InMemoryParameterStore;
    use crate::infra::repository::InMemoryRepository;
    use flocs_common::Task;
    use std::sync::Arc;

    const LEARNER: LearnerId = LearnerId(1);
    const TASK: TaskId = TaskId(1);

    async fn context(skill: f64, difficulty: f64) -> PracticeContext {
        let store = Arc::new(InMemoryParameterStore::new());
        let repo = InMemoryRepository::new();
        repo.add_task(Task::new(TASK, "maze"));
        store.set_learner_skill(LEARNER, skill);
        store.set_task_difficulty(TASK, difficulty);
        PracticeContext::open(store, &repo, LEARNER, Some(TASK), CommitMode::Overwrite)
            .await
            .unwrap()
    }

    #[test]
    fn test_step_is_bounded() {
        let updater = ParameterUpdater::default();
        assert_eq!(updater.step(100.0), crate::DEFAULT_MAX_STEP);
        assert_eq!(updater.step(-100.0), -crate::DEFAULT_MAX_STEP);
        assert!((updater.step(0.5) - 0.2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_easier_than_predicted_raises_skill() {
        let mut ctx = context(0.0, 0.0).await;
        let shift = ParameterUpdater::default()
            .update_parameters(&mut ctx, LEARNER, TASK, FlowRating::Easy, 2.5)
            .unwrap();

        assert!((shift.error - 1.5).abs() < 1e-12);
        assert!((ctx.get(Factor::StudentBias, None) - 0.5).abs() < 1e-12);
        assert!((ctx.get(Factor::TaskBias, Some(TASK)) + 0.25).abs() < 1e-12);
        assert!(ctx.is_dirty());
    }

    #[tokio::test]
    async fn test_update_moves_prediction_toward_report() {
        let predictor = FlowPredictor::default();
        let updater = ParameterUpdater::default();

        for reported in FlowRating::ALL {
            let mut ctx = context(0.5, 1.0).await;
            let before = predictor.predict_flow(LEARNER, TASK, &ctx);
            updater
                .update_parameters(&mut ctx, LEARNER, TASK, reported, before)
                .unwrap();
            let after = predictor.predict_flow(LEARNER, TASK, &ctx);

            assert!(
                (after - reported.value()).abs() <= (before - reported.value()).abs(),
                "{reported}: {before} -> {after}"
            );
        }
    }

    #[tokio::test]
    async fn test_parameters_stay_in_range() {
        let mut ctx = context(4.9, -4.9).await;
        let updater = ParameterUpdater::default();
        for _ in 0..5 {
            updater
                .update_parameters(&mut ctx, LEARNER, TASK, FlowRating::Easy, 1.0)
                .unwrap();
        }
        assert_eq!(ctx.get(Factor::StudentBias, None), MAX_PARAMETER);
        assert_eq!(ctx.get(Factor::TaskBias, Some(TASK)), MIN_PARAMETER);
    }

    #[tokio::test]
    async fn test_task_outside_scope_rejected() {
        let mut ctx = context(0.0, 0.0).await;
        let result = ParameterUpdater::default().update_parameters(
            &mut ctx,
            LEARNER,
            TaskId(2),
            FlowRating::Right,
            2.0,
        );
        assert!(result.is_err());
    }
}
