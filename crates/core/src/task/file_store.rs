//! File-backed task gateway
//!
//! Stores every task document as JSON in a single file on disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::gateway::TaskGateway;
use super::model::{NewTask, Task, TaskId, TaskStatus};
use crate::{Error, Result};

/// File-based task gateway using JSON
pub struct FileTaskGateway {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory copy of the documents
    cache: RwLock<HashMap<TaskId, Task>>,
}

impl FileTaskGateway {
    /// Open a gateway over `path`
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                let tasks: Vec<Task> = serde_json::from_str(&content)?;
                tasks.into_iter().map(|t| (t.id.clone(), t)).collect()
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Apply `change` to a copy of the documents and write that copy to disk.
    /// The cache only takes the copy once the write succeeded.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut HashMap<TaskId, Task>) -> Result<T>,
    ) -> Result<T> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        let outcome = change(&mut next)?;
        self.persist(&next).await?;
        *cache = next;
        Ok(outcome)
    }

    /// Write the documents back to disk
    async fn persist(&self, documents: &HashMap<TaskId, Task>) -> Result<()> {
        let tasks = sorted(documents.values().cloned().collect());
        let content = serde_json::to_string_pretty(&tasks)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

/// Oldest first, so a freshly created task lands at the end
fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    tasks
}

#[async_trait]
impl TaskGateway for FileTaskGateway {
    async fn create(&self, task: NewTask) -> Result<Task> {
        let task = task.with_id(TaskId::new(Uuid::new_v4().to_string()));
        self.commit(|documents| {
            documents.insert(task.id.clone(), task.clone());
            Ok(())
        })
        .await?;
        debug!(task_id = %task.id, "task document created");
        Ok(task)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let tasks = cache
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(sorted(tasks))
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let cache = self.cache.read().await;
        Ok(cache.get(id).cloned())
    }

    async fn update(&self, task: Task) -> Result<()> {
        self.commit(|documents| {
            if !documents.contains_key(&task.id) {
                return Err(Error::TaskNotFound(task.id.to_string()));
            }
            documents.insert(task.id.clone(), task);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &TaskId) -> Result<bool> {
        if !self.cache.read().await.contains_key(id) {
            return Ok(false);
        }
        self.commit(|documents| Ok(documents.remove(id).is_some()))
            .await
    }

    async fn mark_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        self.commit(|documents| {
            let task = documents
                .get_mut(id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            task.status = status;
            Ok(())
        })
        .await
    }

    async fn delete_where(&self, owner_id: &str, status: TaskStatus) -> Result<u64> {
        let matches = |t: &Task| t.owner_id == owner_id && t.status == status;
        if !self.cache.read().await.values().any(|t| matches(t)) {
            debug!(owner_id, %status, removed = 0, "bulk delete");
            return Ok(0);
        }
        let removed = self
            .commit(|documents| {
                let before = documents.len();
                documents.retain(|_, t| !matches(&*t));
                Ok((before - documents.len()) as u64)
            })
            .await?;
        debug!(owner_id, %status, removed, "bulk delete");
        Ok(removed)
    }
}
