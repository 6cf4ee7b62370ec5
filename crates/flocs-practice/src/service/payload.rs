//! Structured payloads of the practice operations
//!
//! Keys are kebab-case on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flocs_common::InstanceId;

use crate::infra::instructions::Instruction;

/// Result of assigning a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskAssignment {
    pub task_instance_id: InstanceId,
    /// Task content as produced by `Task::to_json`
    pub task: Value,
    /// Position of the task in the learner's current session (1-based)
    pub task_in_session: u32,
    pub instructions: Vec<Instruction>,
}

/// Attempt report sent by the client after running a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttemptReport {
    pub task_instance_id: InstanceId,
    /// Attempts made so far on this instance
    #[serde(rename = "attempt")]
    pub attempt_count: u32,
    pub solved: bool,
    pub given_up: bool,
    /// Seconds spent so far
    #[serde(rename = "time")]
    pub time_spent: u32,
}

impl AttemptReport {
    pub fn new(task_instance_id: InstanceId, attempt_count: u32, solved: bool) -> Self {
        Self {
            task_instance_id,
            attempt_count,
            solved,
            given_up: false,
            time_spent: 0,
        }
    }

    pub fn with_time(mut self, seconds: u32) -> Self {
        self.time_spent = seconds;
        self
    }

    pub fn with_given_up(mut self) -> Self {
        self.given_up = true;
        self
    }
}

/// Outcome of an attempt report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttemptOutcome {
    pub task_solved_first_time: bool,
    pub earned_credits: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attempt_report_wire_names() {
        let report: AttemptReport = serde_json::from_value(json!({
            "task-instance-id": 12,
            "attempt": 3,
            "solved": true,
            "given-up": false,
            "time": 95,
        }))
        .unwrap();

        assert_eq!(report.task_instance_id, InstanceId(12));
        assert_eq!(report.attempt_count, 3);
        assert_eq!(report.time_spent, 95);
        assert!(report.solved);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result: Result<AttemptReport, _> = serde_json::from_value(json!({
            "task-instance-id": 12,
            "solved": true,
            "time": 5,
        }));
        assert!(result.unwrap_err().to_string().contains("attempt"));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = AttemptOutcome {
            task_solved_first_time: true,
            earned_credits: 5,
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            json!({"task-solved-first-time": true, "earned-credits": 5})
        );
    }
}
