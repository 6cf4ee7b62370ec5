//! Practice Context
//!
//! A unit of work over one learner's parameter snapshot. Values are loaded when
//! the context is opened, mutated in memory, and written back only by
//! [`PracticeContext::save`], which sends just the entries touched since the
//! last save.
//!
//! ## Concurrency
//!
//! Task difficulty is shared by every learner. With [`CommitMode::Overwrite`]
//! two contexts that update the same task concurrently both write absolute
//! values, so the later commit silently discards the earlier one. This lost
//! update is tolerated at low load. [`CommitMode::Delta`] commits
//! `new - loaded` per key instead and lets the store apply each delta
//! atomically, which keeps both updates. Factors that are not additive
//! (see [`Factor::is_additive`]) are written as plain values in both modes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use flocs_common::{Factor, FlocsError, LearnerId, ParameterKey, Result, TaskId};

use crate::infra::parameter_store::{ParameterStore, ParameterWrite};
use crate::infra::repository::PracticeRepository;

/// How dirty values are written back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Write absolute values (last writer wins)
    #[default]
    Overwrite,
    /// Write per-key deltas applied atomically by the store
    ///
    /// Non-additive factors are still written as absolute values.
    Delta,
}

/// Learner (and optionally task) a context is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextScope {
    pub learner: LearnerId,
    pub task: Option<TaskId>,
}

impl ContextScope {
    pub fn learner(learner: LearnerId) -> Self {
        Self {
            learner,
            task: None,
        }
    }

    pub fn learner_task(learner: LearnerId, task: TaskId) -> Self {
        Self {
            learner,
            task: Some(task),
        }
    }

    /// Whether `key` is visible from this scope
    pub fn covers(&self, key: &ParameterKey) -> bool {
        match (key.task, self.task) {
            (None, _) | (Some(_), None) => true,
            (Some(task), Some(scoped)) => task == scoped,
        }
    }
}

/// Parameter snapshot of one learner
pub struct PracticeContext {
    scope: ContextScope,
    values: HashMap<ParameterKey, f64>,
    /// Values as last loaded or saved, the base for delta commits
    loaded: HashMap<ParameterKey, f64>,
    dirty: BTreeSet<ParameterKey>,
    task_ids: BTreeSet<TaskId>,
    store: Arc<dyn ParameterStore>,
    commit_mode: CommitMode,
}

impl PracticeContext {
    /// Load a snapshot for `learner`, narrowed to `task` if given
    pub async fn open(
        store: Arc<dyn ParameterStore>,
        repository: &dyn PracticeRepository,
        learner: LearnerId,
        task: Option<TaskId>,
        commit_mode: CommitMode,
    ) -> Result<Self> {
        let scope = ContextScope { learner, task };
        let values = store.load(&scope).await?;
        let task_ids = repository.eligible_task_ids(learner).await?;

        debug!(%learner, task = ?task, parameters = values.len(), eligible = task_ids.len(), "Opened practice context");

        Ok(Self {
            scope,
            loaded: values.clone(),
            values,
            dirty: BTreeSet::new(),
            task_ids,
            store,
            commit_mode,
        })
    }

    pub fn scope(&self) -> ContextScope {
        self.scope
    }

    pub fn learner(&self) -> LearnerId {
        self.scope.learner
    }

    /// Eligible task ids captured when the context was opened
    pub fn get_all_task_ids(&self) -> &BTreeSet<TaskId> {
        &self.task_ids
    }

    /// Current value, or the factor default if nothing is loaded
    ///
    /// Reading a task outside a narrowed scope yields the default.
    pub fn get(&self, factor: Factor, task: Option<TaskId>) -> f64 {
        self.values
            .get(&ParameterKey { factor, task })
            .copied()
            .unwrap_or_else(|| factor.default_value())
    }

    /// Replace a value with `update(current)` in memory, returning the new value
    pub fn update<F>(&mut self, factor: Factor, task: Option<TaskId>, update: F) -> Result<f64>
    where
        F: FnOnce(f64) -> f64,
    {
        let key = ParameterKey { factor, task };
        if !key.is_well_formed() {
            return Err(FlocsError::InvalidArgument(format!(
                "factor {factor} is {:?}-scoped, got task {task:?}",
                factor.scope()
            )));
        }
        if !self.scope.covers(&key) {
            return Err(FlocsError::InvalidArgument(format!(
                "{key} is outside the context of learner {} narrowed to task {:?}",
                self.scope.learner, self.scope.task
            )));
        }

        let value = update(self.get(factor, task));
        self.values.insert(key, value);
        self.dirty.insert(key);
        Ok(value)
    }

    /// Keys changed since open or the last save
    pub fn dirty_keys(&self) -> impl Iterator<Item = &ParameterKey> {
        self.dirty.iter()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Write every dirty value back to the store
    ///
    /// Returns the number of values written.
    pub async fn save(&mut self) -> Result<usize> {
        if self.dirty.is_empty() {
            return Ok(0);
        }

        let writes: Vec<ParameterWrite> = self
            .dirty
            .iter()
            .map(|key| {
                let value = self.get(key.factor, key.task);
                match self.commit_mode {
                    CommitMode::Delta if key.factor.is_additive() => {
                        let base = self
                            .loaded
                            .get(key)
                            .copied()
                            .unwrap_or_else(|| key.factor.default_value());
                        ParameterWrite::Add(*key, value - base)
                    }
                    CommitMode::Delta | CommitMode::Overwrite => ParameterWrite::Set(*key, value),
                }
            })
            .collect();

        let written = writes.len();
        self.store.write(self.scope.learner, writes).await?;

        for key in std::mem::take(&mut self.dirty) {
            let value = self.get(key.factor, key.task);
            self.loaded.insert(key, value);
        }

        debug!(learner = %self.scope.learner, written, mode = ?self.commit_mode, "Saved practice context");
        Ok(written)
    }
}

impl std::fmt::Debug for PracticeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticeContext")
            .field("scope", &self.scope)
            .field("values", &self.values.len())
            .field("dirty", &self.dirty)
            .field("eligible", &self.task_ids.len())
            .field("commit_mode", &self.commit_mode)
            .finish()
    }
}
