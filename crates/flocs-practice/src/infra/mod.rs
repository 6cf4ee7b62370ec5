//! Collaborator traits and their in-memory implementations

pub mod instructions;
pub mod parameter_store;
pub mod repository;
pub mod session;
