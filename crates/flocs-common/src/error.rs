//! Error types for the practice engine
//!
//! Provides a unified error type and a coarse classification used by callers
//! to map failures onto responses.

use thiserror::Error;

use crate::types::ids::{InstanceId, LearnerId, TaskId};

/// Result type alias using FlocsError
pub type Result<T> = std::result::Result<T, FlocsError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed argument, or a report not owned by the caller
    InvalidArgument,
    /// Unknown entity or nothing eligible
    NotFound,
    /// Report older than the stored state, or a repeated flow report
    StaleState,
    /// Numeric operand outside its supported range
    DomainRange,
    /// Engine configuration the service cannot work with
    Infrastructure,
}

/// Unified error type for practice operations
#[derive(Debug, Error)]
pub enum FlocsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task instance {instance} belongs to learner {owner}, not learner {claimed}")]
    NotOwner {
        instance: InstanceId,
        owner: LearnerId,
        claimed: LearnerId,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No tasks available for learner {learner}")]
    NoEligibleTasks { learner: LearnerId },

    #[error("Requested task {task} is not eligible for learner {learner}")]
    TaskNotEligible { task: TaskId, learner: LearnerId },

    #[error("Obsolete attempt report for task instance {instance}: attempt {reported} < stored {stored}")]
    StaleReport {
        instance: InstanceId,
        reported: u32,
        stored: u32,
    },

    #[error("Flow already reported for task instance {instance}")]
    FlowAlreadyReported { instance: InstanceId },

    #[error("{operand} = {value} is outside the supported range [{min}, {max}]")]
    DomainRange {
        operand: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlocsError {
    /// Shorthand for a not-found error
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        FlocsError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlocsError::InvalidArgument(_) | FlocsError::NotOwner { .. } => {
                ErrorKind::InvalidArgument
            }
            FlocsError::NotFound { .. }
            | FlocsError::NoEligibleTasks { .. }
            | FlocsError::TaskNotEligible { .. } => ErrorKind::NotFound,
            FlocsError::StaleReport { .. } | FlocsError::FlowAlreadyReported { .. } => {
                ErrorKind::StaleState
            }
            FlocsError::DomainRange { .. } => ErrorKind::DomainRange,
            FlocsError::Config(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<anyhow::Error> for FlocsError {
    fn from(err: anyhow::Error) -> Self {
        FlocsError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_operand() {
        let err = FlocsError::StaleReport {
            instance: InstanceId(7),
            reported: 1,
            stored: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("7"));
        assert!(msg.contains("1 < stored 3"));
        assert_eq!(err.kind(), ErrorKind::StaleState);
    }

    #[test]
    fn test_ownership_is_invalid_argument() {
        let err = FlocsError::NotOwner {
            instance: InstanceId(1),
            owner: LearnerId(2),
            claimed: LearnerId(3),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("learner 3"));
    }

    #[test]
    fn test_eligibility_errors_are_not_found() {
        let err = FlocsError::TaskNotEligible {
            task: TaskId(4),
            learner: LearnerId(1),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            FlocsError::not_found("Task", TaskId(9)).to_string(),
            "Task not found: 9"
        );
    }

    #[test]
    fn test_config_failure_is_infrastructure() {
        let err: FlocsError = anyhow::anyhow!("session.timeout_minutes must be positive").into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_repeated_flow_report_is_stale() {
        let err = FlocsError::FlowAlreadyReported {
            instance: InstanceId(5),
        };
        assert_eq!(err.kind(), ErrorKind::StaleState);
        assert!(err.to_string().contains("instance 5"));
    }
}
