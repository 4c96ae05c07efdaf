//! Task persistence gateway
//!
//! Defines the interface the task store uses to reach the document store.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskId, TaskStatus};
use crate::Result;

/// Gateway interface for task persistence operations
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Persist a new task and return it with its assigned id
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// All tasks belonging to `owner_id`
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>>;

    /// Get a task by id
    async fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Replace a stored task. Fails with `TaskNotFound` if the id is unknown.
    async fn update(&self, task: Task) -> Result<()>;

    /// Delete a task by id, returning whether anything was removed
    async fn delete(&self, id: &TaskId) -> Result<bool>;

    /// Set the status of an existing task.
    ///
    /// Existence is checked before writing; an unknown id yields `TaskNotFound`.
    async fn mark_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Delete every task of `owner_id` in `status`, returning the number removed
    async fn delete_where(&self, owner_id: &str, status: TaskStatus) -> Result<u64>;
}
