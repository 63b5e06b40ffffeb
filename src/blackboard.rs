use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::BlackboardError;
use crate::task::Task;

/// Shared task store. The single mutable resource shared across agents:
/// the supervisor's authoritative view of task state, independent of
/// message delivery. Implementations serialize all access internally
/// since the bus may deliver several TASK_RESULT messages concurrently.
#[async_trait]
pub trait Blackboard: Send + Sync {
    /// Store a new task keyed by id. Fails on a duplicate id.
    async fn create_task(&self, task: Task) -> Result<(), BlackboardError>;

    /// Replace a stored task. Last-write-wins, no conflict detection.
    async fn update_task(&self, task: Task) -> Result<(), BlackboardError>;

    /// The task with the given id, if it exists.
    async fn get_task(&self, id: Uuid) -> Option<Task>;
}

/// Mutex-guarded in-memory store. Tasks live for the supervisor's
/// lifetime; durability across restarts is a backend concern, not ours.
#[derive(Default)]
pub struct InMemoryBlackboard {
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl InMemoryBlackboard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[async_trait]
impl Blackboard for InMemoryBlackboard {
    async fn create_task(&self, task: Task) -> Result<(), BlackboardError> {
        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(&task.id) {
            return Err(BlackboardError::Duplicate(task.id));
        }
        tasks.insert(task.id, task);
        Ok(())
    }

    async fn update_task(&self, task: Task) -> Result<(), BlackboardError> {
        let mut tasks = self.tasks.lock().await;
        if !tasks.contains_key(&task.id) {
            return Err(BlackboardError::NotFound(task.id));
        }
        tasks.insert(task.id, task);
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Option<Task> {
        self.tasks.lock().await.get(&id).cloned()
    }
}
