//! Model parameter vocabulary
//!
//! A parameter is a named factor, optionally narrowed to one task. Each factor
//! has a fixed scope that decides whether it is owned by the learner, shared by
//! every learner practising a task, or tracked per (learner, task) pair.

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use crate::{MAX_PARAMETER, MIN_PARAMETER};

/// Who owns a factor's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorScope {
    /// One value per learner
    Learner,
    /// One value per task, shared across learners
    Task,
    /// One value per (learner, task) pair
    LearnerTask,
}

impl FactorScope {
    /// Whether keys of this scope carry a task id
    pub fn is_task_scoped(self) -> bool {
        !matches!(self, FactorScope::Learner)
    }
}

/// Named model parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Factor {
    /// Learner skill
    StudentBias,
    /// Task difficulty
    TaskBias,
    /// How many times the learner solved the task
    SolutionCount,
    /// Learner's assignment sequence counter
    TasksAssigned,
    /// Value of `TasksAssigned` when the task was last assigned (0 = never)
    LastAssigned,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::StudentBias,
        Factor::TaskBias,
        Factor::SolutionCount,
        Factor::TasksAssigned,
        Factor::LastAssigned,
    ];

    pub fn scope(self) -> FactorScope {
        match self {
            Factor::StudentBias | Factor::TasksAssigned => FactorScope::Learner,
            Factor::TaskBias => FactorScope::Task,
            Factor::SolutionCount | Factor::LastAssigned => FactorScope::LearnerTask,
        }
    }

    /// Value used when nothing has been stored yet
    pub fn default_value(self) -> f64 {
        0.0
    }

    /// Supported range of the factor, if it is bounded
    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Factor::StudentBias | Factor::TaskBias => Some((MIN_PARAMETER, MAX_PARAMETER)),
            Factor::SolutionCount | Factor::TasksAssigned | Factor::LastAssigned => None,
        }
    }

    /// `value` pulled into the factor's range
    pub fn clamp(self, value: f64) -> f64 {
        match self.bounds() {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }

    /// Whether concurrent changes to the factor compose by addition
    ///
    /// `LastAssigned` holds an absolute sequence marker, so it is always
    /// committed as a plain value.
    pub fn is_additive(self) -> bool {
        !matches!(self, Factor::LastAssigned)
    }

    pub fn name(self) -> &'static str {
        match self {
            Factor::StudentBias => "student-bias",
            Factor::TaskBias => "task-bias",
            Factor::SolutionCount => "solution-count",
            Factor::TasksAssigned => "tasks-assigned",
            Factor::LastAssigned => "last-assigned",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Key of a parameter inside a learner's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterKey {
    pub factor: Factor,
    pub task: Option<TaskId>,
}

impl ParameterKey {
    /// Key of a learner-scoped factor
    pub fn learner(factor: Factor) -> Self {
        Self { factor, task: None }
    }

    /// Key of a task-scoped (shared or per-learner) factor
    pub fn task(factor: Factor, task: TaskId) -> Self {
        Self {
            factor,
            task: Some(task),
        }
    }

    /// Whether the presence of a task id matches the factor's scope
    pub fn is_well_formed(&self) -> bool {
        self.factor.scope().is_task_scoped() == self.task.is_some()
    }
}

impl std::fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.task {
            Some(task) => write!(f, "{}[task {}]", self.factor, task),
            None => write!(f, "{}", self.factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scope_validation() {
        assert!(ParameterKey::learner(Factor::StudentBias).is_well_formed());
        assert!(ParameterKey::task(Factor::TaskBias, TaskId(1)).is_well_formed());
        assert!(!ParameterKey::learner(Factor::SolutionCount).is_well_formed());
        assert!(!ParameterKey::task(Factor::TasksAssigned, TaskId(1)).is_well_formed());
    }

    #[test]
    fn test_bias_factors_are_bounded() {
        assert_eq!(Factor::TaskBias.clamp(-5.1), MIN_PARAMETER);
        assert_eq!(Factor::StudentBias.clamp(9.0), MAX_PARAMETER);
        assert_eq!(Factor::SolutionCount.clamp(42.0), 42.0);
        assert!(Factor::TasksAssigned.bounds().is_none());
    }

    #[test]
    fn test_sequence_marker_is_not_additive() {
        assert!(!Factor::LastAssigned.is_additive());
        assert!(Factor::TasksAssigned.is_additive());
        assert!(Factor::TaskBias.is_additive());
    }

    #[test]
    fn test_key_display() {
        let key = ParameterKey::task(Factor::SolutionCount, TaskId(3));
        assert_eq!(key.to_string(), "solution-count[task 3]");
    }
}
