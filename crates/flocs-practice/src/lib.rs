//! # FLOCS Practice
//!
//! Adaptive task selection for programming practice. The engine picks the next
//! task for a learner, predicts how the task will feel ("flow") before it is
//! attempted, and after the learner reports back it nudges the learner's skill
//! and the task's difficulty so the next prediction is closer to reality.
//!
//! ## Key Concepts
//!
//! - **Practice Context**: unit of work over one learner's parameter snapshot
//! - **Flow Predictor**: skill vs. difficulty mapped onto the flow-rating scale
//! - **Task Selector**: score-maximizing or pinned to a requested task
//! - **Parameter Updater**: bounded correction from the prediction error
//! - **Credit Calculator**: reward for the first solve of a task
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   PracticeService                       │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐      │
//! │  │   Assign    │  │   Attempt   │  │    Flow     │      │
//! │  │    Task     │  │   Report    │  │   Report    │      │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘      │
//! │         │                │                │             │
//! │  ┌──────┴────────────────┴────────────────┴──────┐      │
//! │  │               PracticeContext                 │      │
//! │  │   Selector · Predictor · Updater · Credits    │      │
//! │  └──────────────────────┬────────────────────────┘      │
//! │                         │                               │
//! │  ┌──────────────────────┴────────────────────────┐      │
//! │  │  ParameterStore · PracticeRepository          │      │
//! │  │  SessionTracker · InstructionsProvider        │      │
//! │  └───────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod domain;
pub mod infra;
pub mod service;
pub mod telemetry;

// Re-export core types
pub use domain::context::{CommitMode, ContextScope, PracticeContext};
pub use domain::credits::CreditCalculator;
pub use domain::parameters_update::ParameterUpdater;
pub use domain::prediction::FlowPredictor;
pub use domain::selection::{ScoreSelector, TaskSelector};

// Re-export service
pub use service::payload::{AttemptOutcome, AttemptReport, TaskAssignment};
pub use service::practice_service::{InMemoryPractice, PracticeService};

// Re-export infrastructure
pub use infra::instructions::{ConceptInstructions, Instruction, InstructionsProvider};
pub use infra::parameter_store::{InMemoryParameterStore, ParameterStore, ParameterWrite};
pub use infra::repository::{InMemoryRepository, PracticeRepository};
pub use infra::session::{InMemorySessionTracker, SessionState, SessionTracker};

/// Flow the selector aims for ("right" on the rating scale)
pub const DEFAULT_TARGET_FLOW: f64 = 3.0;

/// Default step size of the parameter update
pub const DEFAULT_LEARNING_RATE: f64 = 0.4;

/// Largest change a single flow report may cause to a bias parameter
pub const DEFAULT_MAX_STEP: f64 = 0.5;

/// Default inactivity after which a new practice session starts
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 120;
