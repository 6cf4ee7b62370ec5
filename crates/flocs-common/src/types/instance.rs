//! Task instances and per (learner, task) aggregates
//!
//! A [`TaskInstance`] is created once per assignment. Its predicted flow is
//! captured at creation and never recomputed; attempt reports move the attempt
//! counter forward and a single flow report fills in the reported flow.
//!
//! A [`TaskAggregate`] remembers the most recent instance and the most recent
//! solved instance of a task for one learner. The solved reference is never
//! cleared, so "solved before" can only go from false to true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flow::FlowRating;
use super::ids::{InstanceId, LearnerId, SessionId, TaskId};

/// Fields needed to create an instance
#[derive(Debug, Clone)]
pub struct NewTaskInstance {
    pub learner: LearnerId,
    pub task: TaskId,
    pub session: SessionId,
    pub predicted_flow: f64,
}

/// One assignment of a task to a learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: InstanceId,
    pub learner: LearnerId,
    pub task: TaskId,
    pub session: SessionId,

    /// Flow predicted at assignment time
    pub predicted_flow: f64,

    /// Number of attempts reported so far
    pub attempt_count: u32,

    pub solved: bool,

    pub given_up: bool,

    /// Seconds spent on the task
    pub time_spent: u32,

    pub reported_flow: Option<FlowRating>,

    pub created_at: DateTime<Utc>,
}

impl TaskInstance {
    pub fn new(id: InstanceId, new: NewTaskInstance) -> Self {
        Self {
            id,
            learner: new.learner,
            task: new.task,
            session: new.session,
            predicted_flow: new.predicted_flow,
            attempt_count: 0,
            solved: false,
            given_up: false,
            time_spent: 0,
            reported_flow: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the instance is owned by `learner`
    pub fn belongs_to(&self, learner: LearnerId) -> bool {
        self.learner == learner
    }

    /// Apply an attempt report
    ///
    /// The caller has already rejected reports older than `attempt_count`.
    /// A solved instance stays solved.
    pub fn update_after_attempt(&mut self, attempt_count: u32, time_spent: u32, solved: bool) {
        self.attempt_count = self.attempt_count.max(attempt_count);
        self.time_spent = time_spent;
        self.solved |= solved;
    }

    pub fn mark_given_up(&mut self) {
        self.given_up = true;
    }

    pub fn set_reported_flow(&mut self, flow: FlowRating) {
        self.reported_flow = Some(flow);
    }
}

/// Rollup of a learner's history with one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAggregate {
    pub learner: LearnerId,
    pub task: TaskId,
    pub last_instance: Option<InstanceId>,
    pub last_solved_instance: Option<InstanceId>,
}

impl TaskAggregate {
    pub fn new(learner: LearnerId, task: TaskId) -> Self {
        Self {
            learner,
            task,
            last_instance: None,
            last_solved_instance: None,
        }
    }

    pub fn has_solved(&self) -> bool {
        self.last_solved_instance.is_some()
    }

    /// Point the aggregate at a freshly assigned instance
    pub fn record_assignment(&mut self, instance: InstanceId) {
        self.last_instance = Some(instance);
    }

    /// Fold an attempted instance into the aggregate
    pub fn update(&mut self, instance: &TaskInstance) {
        self.last_instance = Some(instance.id);
        if instance.solved {
            self.last_solved_instance = Some(instance.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: u64) -> TaskInstance {
        TaskInstance::new(
            InstanceId(id),
            NewTaskInstance {
                learner: LearnerId(1),
                task: TaskId(2),
                session: SessionId::new(),
                predicted_flow: 2.5,
            },
        )
    }

    #[test]
    fn test_attempt_counter_never_decreases() {
        let mut inst = instance(1);
        inst.update_after_attempt(3, 40, false);
        inst.update_after_attempt(2, 55, true);
        assert_eq!(inst.attempt_count, 3);
        assert_eq!(inst.time_spent, 55);
        assert!(inst.solved);

        inst.update_after_attempt(3, 60, false);
        assert!(inst.solved);
    }

    #[test]
    fn test_solved_reference_is_sticky() {
        let mut agg = TaskAggregate::new(LearnerId(1), TaskId(2));
        assert!(!agg.has_solved());

        let mut solved = instance(1);
        solved.solved = true;
        agg.update(&solved);
        assert_eq!(agg.last_solved_instance, Some(InstanceId(1)));

        let unsolved = instance(2);
        agg.update(&unsolved);
        assert_eq!(agg.last_instance, Some(InstanceId(2)));
        assert_eq!(agg.last_solved_instance, Some(InstanceId(1)));
    }
}
