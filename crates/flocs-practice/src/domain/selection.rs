//! Task selection strategies
//!
//! [`TaskSelector`] is a closed set of strategies chosen by the caller. A new
//! strategy is a new variant.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use tracing::debug;

use flocs_common::{Factor, FlocsError, LearnerId, Result, TaskId};

use crate::config::SelectionSettings;
use crate::domain::context::PracticeContext;
use crate::domain::prediction::FlowPredictor;

/// How the next task is chosen
#[derive(Debug, Clone)]
pub enum TaskSelector {
    /// Best-scoring eligible task
    Score(ScoreSelector),
    /// Exactly the requested task, if eligible
    Pinned(TaskId),
}

impl TaskSelector {
    /// Choose one of `task_ids`
    pub fn select(
        &self,
        task_ids: &BTreeSet<TaskId>,
        learner: LearnerId,
        ctx: &PracticeContext,
    ) -> Result<TaskId> {
        match self {
            TaskSelector::Score(selector) => selector.select(task_ids, learner, ctx),
            TaskSelector::Pinned(task) => {
                if task_ids.contains(task) {
                    Ok(*task)
                } else {
                    Err(FlocsError::TaskNotEligible {
                        task: *task,
                        learner,
                    })
                }
            }
        }
    }
}

/// Picks the task whose predicted flow is closest to the target
///
/// ```text
/// score = -flow_weight * |predicted - target|
///         - solved_weight * min(solutions, solved_cap)
///         + recency_weight * novelty
/// ```
///
/// `novelty` is 1 for a task never assigned to the learner and otherwise
/// grows with the number of assignments since the task was last seen, up to
/// `recency_horizon`. Ties go to the lowest task id.
#[derive(Debug, Clone)]
pub struct ScoreSelector {
    predictor: FlowPredictor,
    settings: SelectionSettings,
}

impl ScoreSelector {
    pub fn new(predictor: FlowPredictor, settings: SelectionSettings) -> Self {
        Self {
            predictor,
            settings,
        }
    }

    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    /// Suitability of `task` for the context's learner
    pub fn score(&self, learner: LearnerId, task: TaskId, ctx: &PracticeContext) -> f64 {
        let s = &self.settings;

        let predicted = self.predictor.predict_flow(learner, task, ctx);
        let solutions = ctx
            .get(Factor::SolutionCount, Some(task))
            .clamp(0.0, f64::from(s.solved_cap));

        s.recency_weight * self.novelty(task, ctx)
            - s.flow_weight * (predicted - s.target_flow).abs()
            - s.solved_weight * solutions
    }

    fn novelty(&self, task: TaskId, ctx: &PracticeContext) -> f64 {
        let last = ctx.get(Factor::LastAssigned, Some(task));
        if last <= 0.0 {
            return 1.0;
        }
        let horizon = f64::from(self.settings.recency_horizon.max(1));
        let since = (ctx.get(Factor::TasksAssigned, None) - last).max(0.0);
        since.min(horizon) / horizon
    }

    pub fn select(
        &self,
        task_ids: &BTreeSet<TaskId>,
        learner: LearnerId,
        ctx: &PracticeContext,
    ) -> Result<TaskId> {
        let mut best: Option<(TaskId, OrderedFloat<f64>)> = None;

        // Ascending ids, strict improvement only: ties keep the lower id
        for &task in task_ids {
            let score = OrderedFloat(self.score(learner, task, ctx));
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((task, score));
            }
        }

        let (task, score) = best.ok_or(FlocsError::NoEligibleTasks { learner })?;
        debug!(%learner, %task, score = score.0, candidates = task_ids.len(), "Selected task");
        Ok(task)
    }
}

impl Default for ScoreSelector {
    fn default() -> Self {
        Self::new(FlowPredictor::default(), SelectionSettings::default())
    }
}
