//! # FLOCS Common
//!
//! Shared types and errors for the FLOCS adaptive practice engine.
//!
//! ## Core Types
//!
//! - [`LearnerId`], [`TaskId`], [`InstanceId`], [`SessionId`]: entity identifiers
//! - [`Task`]: exercise record with its structured content
//! - [`TaskInstance`]: one assignment of a task to a learner
//! - [`TaskAggregate`]: per (learner, task) rollup of recent instances
//! - [`FlowRating`]: ordered self-report scale ("very difficult" .. "easy")
//! - [`Factor`]/[`ParameterKey`]: vocabulary of model parameters
//!
//! ## Errors
//!
//! - [`FlocsError`]: unified error type, grouped by [`ErrorKind`]

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ErrorKind, FlocsError, Result};
pub use types::{
    factor::{Factor, FactorScope, ParameterKey},
    flow::FlowRating,
    ids::{InstanceId, LearnerId, SessionId, TaskId},
    instance::{NewTaskInstance, TaskAggregate, TaskInstance},
    task::Task,
};

/// FLOCS version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lowest supported value of a bias parameter (skill or difficulty)
pub const MIN_PARAMETER: f64 = -5.0;

/// Highest supported value of a bias parameter (skill or difficulty)
pub const MAX_PARAMETER: f64 = 5.0;
