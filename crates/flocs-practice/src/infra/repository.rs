//! Entity storage for tasks, task instances and aggregates

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use flocs_common::{
    FlocsError, InstanceId, LearnerId, NewTaskInstance, Result, Task, TaskAggregate, TaskId,
    TaskInstance,
};

/// Trait for the persistence collaborator behind the practice service
#[async_trait]
pub trait PracticeRepository: Send + Sync {
    /// Get a task by ID
    async fn get_task(&self, id: TaskId) -> Result<Task>;

    /// Tasks the learner may be assigned right now
    async fn eligible_task_ids(&self, learner: LearnerId) -> Result<BTreeSet<TaskId>>;

    /// Create and store a new task instance
    async fn create_instance(&self, new: NewTaskInstance) -> Result<TaskInstance>;

    /// Get a task instance by ID
    async fn get_instance(&self, id: InstanceId) -> Result<TaskInstance>;

    /// Replace a stored task instance
    async fn save_instance(&self, instance: &TaskInstance) -> Result<()>;

    /// Get the (learner, task) aggregate, creating an empty one if missing
    async fn get_or_create_aggregate(
        &self,
        learner: LearnerId,
        task: TaskId,
    ) -> Result<TaskAggregate>;

    /// Replace a stored aggregate
    async fn save_aggregate(&self, aggregate: &TaskAggregate) -> Result<()>;
}

/// In-memory repository
///
/// Every catalogue task is eligible unless it was blocked for the learner.
pub struct InMemoryRepository {
    tasks: DashMap<TaskId, Task>,
    instances: DashMap<InstanceId, TaskInstance>,
    aggregates: DashMap<(LearnerId, TaskId), TaskAggregate>,
    /// Tasks withheld per learner
    blocked: RwLock<HashMap<LearnerId, HashSet<TaskId>>>,
    next_instance_id: AtomicU64,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self {
            tasks: DashMap::new(),
            instances: DashMap::new(),
            aggregates: DashMap::new(),
            blocked: RwLock::new(HashMap::new()),
            next_instance_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a catalogue task
    pub fn add_task(&self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Withhold a task from a learner
    pub fn block_task(&self, learner: LearnerId, task: TaskId) {
        self.blocked.write().entry(learner).or_default().insert(task);
    }

    pub fn unblock_task(&self, learner: LearnerId, task: TaskId) {
        if let Some(tasks) = self.blocked.write().get_mut(&learner) {
            tasks.remove(&task);
        }
    }

    /// Stored instance, if any
    pub fn instance(&self, id: InstanceId) -> Option<TaskInstance> {
        self.instances.get(&id).map(|i| i.clone())
    }

    /// Stored aggregate without creating one
    pub fn aggregate(&self, learner: LearnerId, task: TaskId) -> Option<TaskAggregate> {
        self.aggregates.get(&(learner, task)).map(|a| a.clone())
    }

    /// All instances of a learner, oldest first
    pub fn learner_instances(&self, learner: LearnerId) -> Vec<TaskInstance> {
        let mut instances: Vec<TaskInstance> = self
            .instances
            .iter()
            .filter(|i| i.learner == learner)
            .map(|i| i.clone())
            .collect();
        instances.sort_by_key(|i| i.id);
        instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[async_trait]
impl PracticeRepository for InMemoryRepository {
    async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.tasks
            .get(&id)
            .map(|t| t.clone())
            .ok_or_else(|| FlocsError::not_found("Task", id))
    }

    async fn eligible_task_ids(&self, learner: LearnerId) -> Result<BTreeSet<TaskId>> {
        let blocked = self.blocked.read();
        let withheld = blocked.get(&learner);
        Ok(self
            .tasks
            .iter()
            .map(|t| *t.key())
            .filter(|id| withheld.map_or(true, |w| !w.contains(id)))
            .collect())
    }

    async fn create_instance(&self, new: NewTaskInstance) -> Result<TaskInstance> {
        if !self.tasks.contains_key(&new.task) {
            return Err(FlocsError::not_found("Task", new.task));
        }
        let id = InstanceId(self.next_instance_id.fetch_add(1, Ordering::SeqCst));
        let instance = TaskInstance::new(id, new);
        self.instances.insert(id, instance.clone());
        Ok(instance)
    }

    async fn get_instance(&self, id: InstanceId) -> Result<TaskInstance> {
        self.instances
            .get(&id)
            .map(|i| i.clone())
            .ok_or_else(|| FlocsError::not_found("Task instance", id))
    }

    async fn save_instance(&self, instance: &TaskInstance) -> Result<()> {
        match self.instances.get_mut(&instance.id) {
            Some(mut stored) => {
                *stored = instance.clone();
                Ok(())
            }
            None => Err(FlocsError::not_found("Task instance", instance.id)),
        }
    }

    async fn get_or_create_aggregate(
        &self,
        learner: LearnerId,
        task: TaskId,
    ) -> Result<TaskAggregate> {
        Ok(self
            .aggregates
            .entry((learner, task))
            .or_insert_with(|| TaskAggregate::new(learner, task))
            .clone())
    }

    async fn save_aggregate(&self, aggregate: &TaskAggregate) -> Result<()> {
        self.aggregates
            .insert((aggregate.learner, aggregate.task), aggregate.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flocs_common::SessionId;

    fn repo_with_tasks(ids: &[u64]) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for id in ids {
            repo.add_task(Task::new(TaskId(*id), format!("task {id}")));
        }
        repo
    }

    #[tokio::test]
    async fn test_blocked_tasks_not_eligible() {
        let repo = repo_with_tasks(&[1, 2, 3]);
        repo.block_task(LearnerId(1), TaskId(2));

        let eligible = repo.eligible_task_ids(LearnerId(1)).await.unwrap();
        assert_eq!(eligible, BTreeSet::from([TaskId(1), TaskId(3)]));

        let other = repo.eligible_task_ids(LearnerId(2)).await.unwrap();
        assert_eq!(other.len(), 3);

        repo.unblock_task(LearnerId(1), TaskId(2));
        assert_eq!(repo.eligible_task_ids(LearnerId(1)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_instance_lifecycle() {
        let repo = repo_with_tasks(&[1]);
        let mut instance = repo
            .create_instance(NewTaskInstance {
                learner: LearnerId(1),
                task: TaskId(1),
                session: SessionId::new(),
                predicted_flow: 3.0,
            })
            .await
            .unwrap();
        assert_eq!(instance.attempt_count, 0);

        instance.update_after_attempt(2, 30, true);
        repo.save_instance(&instance).await.unwrap();

        let stored = repo.get_instance(instance.id).await.unwrap();
        assert_eq!(stored, instance);
        assert_eq!(repo.learner_instances(LearnerId(1)).len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_entities() {
        let repo = repo_with_tasks(&[]);
        let err = repo.get_instance(InstanceId(99)).await.unwrap_err();
        assert!(err.to_string().contains("99"));

        let err = repo
            .create_instance(NewTaskInstance {
                learner: LearnerId(1),
                task: TaskId(5),
                session: SessionId::new(),
                predicted_flow: 3.0,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Task not found: 5"));
    }

    #[tokio::test]
    async fn test_get_or_create_aggregate_is_stable() {
        let repo = repo_with_tasks(&[1]);
        let mut agg = repo
            .get_or_create_aggregate(LearnerId(1), TaskId(1))
            .await
            .unwrap();
        agg.record_assignment(InstanceId(4));
        repo.save_aggregate(&agg).await.unwrap();

        let again = repo
            .get_or_create_aggregate(LearnerId(1), TaskId(1))
            .await
            .unwrap();
        assert_eq!(again.last_instance, Some(InstanceId(4)));
    }
}
