//! Practice domain logic
//!
//! Flow prediction, task selection, parameter updates and credit awarding
//! over a learner's parameter snapshot.

pub mod context;
pub mod credits;
pub mod parameters_update;
pub mod prediction;
pub mod selection;
