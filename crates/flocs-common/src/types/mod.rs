//! Core data types for the practice engine

pub mod factor;
pub mod flow;
pub mod ids;
pub mod instance;
pub mod task;
