//! Practice operations exposed to callers

pub mod payload;
pub mod practice_service;
