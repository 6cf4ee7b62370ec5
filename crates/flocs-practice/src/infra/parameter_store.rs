//! Parameter Storage Implementations
//!
//! Storage backends for model parameters (skills, difficulties, counters).

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use flocs_common::{Factor, FactorScope, FlocsError, LearnerId, ParameterKey, Result, TaskId};

use crate::domain::context::ContextScope;

/// A single change committed by a practice context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterWrite {
    /// Replace the stored value
    Set(ParameterKey, f64),
    /// Add to the stored value (or to the factor default) atomically
    Add(ParameterKey, f64),
}

impl ParameterWrite {
    pub fn key(&self) -> ParameterKey {
        match self {
            ParameterWrite::Set(key, _) | ParameterWrite::Add(key, _) => *key,
        }
    }
}

/// Trait for parameter storage backends
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Load every stored value visible from `scope`
    ///
    /// Learner factors of the scope's learner, task factors and learner-task
    /// factors of all tasks (or only `scope.task` when narrowed).
    async fn load(&self, scope: &ContextScope) -> Result<HashMap<ParameterKey, f64>>;

    /// Persist a batch of writes made on behalf of `learner`
    async fn write(&self, learner: LearnerId, writes: Vec<ParameterWrite>) -> Result<()>;
}

/// Storage key: task-scoped factors are shared, so they have no owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StoredKey {
    owner: Option<LearnerId>,
    key: ParameterKey,
}

impl StoredKey {
    fn new(learner: LearnerId, key: ParameterKey) -> Self {
        let owner = match key.factor.scope() {
            FactorScope::Task => None,
            FactorScope::Learner | FactorScope::LearnerTask => Some(learner),
        };
        Self { owner, key }
    }
}

/// In-memory parameter storage
///
/// Uses DashMap so that `ParameterWrite::Add` is applied under the entry's
/// shard lock, which makes delta commits safe against concurrent writers.
/// Written values of bounded factors are clamped to the factor's range.
#[derive(Default)]
pub struct InMemoryParameterStore {
    values: DashMap<StoredKey, f64>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the shared difficulty of a task
    pub fn set_task_difficulty(&self, task: TaskId, difficulty: f64) {
        let key = ParameterKey::task(Factor::TaskBias, task);
        self.values.insert(StoredKey { owner: None, key }, difficulty);
    }

    /// Seed a learner's skill
    pub fn set_learner_skill(&self, learner: LearnerId, skill: f64) {
        let key = ParameterKey::learner(Factor::StudentBias);
        self.values.insert(StoredKey::new(learner, key), skill);
    }

    /// Stored value as seen by `learner`, if any
    pub fn value(&self, learner: LearnerId, key: ParameterKey) -> Option<f64> {
        self.values.get(&StoredKey::new(learner, key)).map(|v| *v)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn load(&self, scope: &ContextScope) -> Result<HashMap<ParameterKey, f64>> {
        let values: HashMap<ParameterKey, f64> = self
            .values
            .iter()
            .filter(|entry| {
                let stored = entry.key();
                let owner_visible = stored.owner.map_or(true, |owner| owner == scope.learner);
                owner_visible && scope.covers(&stored.key)
            })
            .map(|entry| (entry.key().key, *entry.value()))
            .collect();

        debug!(learner = %scope.learner, task = ?scope.task, loaded = values.len(), "Loaded parameters");
        Ok(values)
    }

    async fn write(&self, learner: LearnerId, writes: Vec<ParameterWrite>) -> Result<()> {
        if let Some(bad) = writes.iter().find(|w| !w.key().is_well_formed()) {
            return Err(FlocsError::InvalidArgument(format!(
                "parameter key {} does not match the scope of its factor",
                bad.key()
            )));
        }

        for write in writes {
            match write {
                ParameterWrite::Set(key, value) => {
                    self.values
                        .insert(StoredKey::new(learner, key), key.factor.clamp(value));
                }
                ParameterWrite::Add(key, delta) => {
                    // Clamped under the entry lock so concurrent deltas
                    // cannot carry a bounded factor out of range
                    let mut stored = self
                        .values
                        .entry(StoredKey::new(learner, key))
                        .or_insert(key.factor.default_value());
                    *stored = key.factor.clamp(*stored + delta);
                }
            }
        }
        Ok(())
    }
}
