//! Flow prediction
//!
//! Maps the gap between learner skill and task difficulty onto the flow scale:
//!
//! ```text
//! predicted = 1 + 3 * sigmoid(skill - difficulty + practice_weight * ln(1 + solutions))
//! ```
//!
//! A learner far above the task predicts close to "easy" (4), far below close
//! to "very difficult" (1). Past solutions of the same task make it feel
//! easier, with diminishing returns.

use flocs_common::{Factor, FlowRating, LearnerId, TaskId};

use crate::config::ModelSettings;
use crate::domain::context::PracticeContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowPredictor {
    practice_weight: f64,
}

impl FlowPredictor {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            practice_weight: settings.practice_weight,
        }
    }

    /// Predicted flow of `task` for the context's learner
    ///
    /// Reads the context only. The same snapshot always yields the same value.
    pub fn predict_flow(&self, learner: LearnerId, task: TaskId, ctx: &PracticeContext) -> f64 {
        debug_assert_eq!(learner, ctx.learner());

        let skill = ctx.get(Factor::StudentBias, None);
        let difficulty = ctx.get(Factor::TaskBias, Some(task));
        let solutions = ctx.get(Factor::SolutionCount, Some(task)).max(0.0);

        let logit = skill - difficulty + self.practice_weight * solutions.ln_1p();
        FlowRating::MIN_VALUE + (FlowRating::MAX_VALUE - FlowRating::MIN_VALUE) * sigmoid(logit)
    }
}

impl Default for FlowPredictor {
    fn default() -> Self {
        Self::new(&ModelSettings::default())
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::CommitMode;
    use crate::infra::parameter_store::InMemoryParameterStore;
    use crate::infra::repository::InMemoryRepository;
    use flocs_common::Task;
    use std::sync::Arc;

    async fn context(skill: f64, difficulty: f64, solutions: f64) -> PracticeContext {
        let store = Arc::new(InMemoryParameterStore::new());
        let repo = InMemoryRepository::new();
        repo.add_task(Task::new(TaskId(1), "maze"));
        store.set_learner_skill(LearnerId(1), skill);
        store.set_task_difficulty(TaskId(1), difficulty);

        let mut ctx = PracticeContext::open(store, &repo, LearnerId(1), None, CommitMode::Overwrite)
            .await
            .unwrap();
        ctx.update(Factor::SolutionCount, Some(TaskId(1)), |_| solutions)
            .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_matched_skill_predicts_middle_of_scale() {
        let ctx = context(1.0, 1.0, 0.0).await;
        let flow = FlowPredictor::default().predict_flow(LearnerId(1), TaskId(1), &ctx);
        assert!((flow - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prediction_stays_on_scale() {
        for (skill, difficulty) in [(-5.0, 5.0), (5.0, -5.0), (0.0, 0.0)] {
            let ctx = context(skill, difficulty, 0.0).await;
            let flow = FlowPredictor::default().predict_flow(LearnerId(1), TaskId(1), &ctx);
            assert!((FlowRating::MIN_VALUE..=FlowRating::MAX_VALUE).contains(&flow));
        }
    }

    #[tokio::test]
    async fn test_harder_task_predicts_lower_flow() {
        let predictor = FlowPredictor::default();
        let easy = predictor.predict_flow(LearnerId(1), TaskId(1), &context(0.0, -1.0, 0.0).await);
        let hard = predictor.predict_flow(LearnerId(1), TaskId(1), &context(0.0, 2.0, 0.0).await);
        assert!(easy > hard);
    }

    #[tokio::test]
    async fn test_practice_raises_flow() {
        let predictor = FlowPredictor::default();
        let fresh = predictor.predict_flow(LearnerId(1), TaskId(1), &context(0.0, 1.0, 0.0).await);
        let practised =
            predictor.predict_flow(LearnerId(1), TaskId(1), &context(0.0, 1.0, 3.0).await);
        assert!(practised > fresh);
    }

    #[tokio::test]
    async fn test_prediction_does_not_touch_context() {
        let store = Arc::new(InMemoryParameterStore::new());
        let repo = InMemoryRepository::new();
        repo.add_task(Task::new(TaskId(1), "maze"));
        let ctx = PracticeContext::open(store, &repo, LearnerId(1), None, CommitMode::Overwrite)
            .await
            .unwrap();

        let predictor = FlowPredictor::default();
        let first = predictor.predict_flow(LearnerId(1), TaskId(1), &ctx);
        let second = predictor.predict_flow(LearnerId(1), TaskId(1), &ctx);
        assert_eq!(first, second);
        assert!(!ctx.is_dirty());
    }
}
