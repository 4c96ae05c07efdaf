//! MongoDB-backed task gateway
//!
//! Tasks live in the `tasks` collection of a remote document database;
//! ids are the hex form of the document `ObjectId`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::gateway::TaskGateway;
use super::model::{NewTask, Task, TaskId, TaskPriority, TaskStatus};
use crate::{Error, Result};

const TASKS_COLLECTION: &str = "tasks";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    owner_id: String,
    title: String,
    #[serde(default)]
    description: String,
    due_date: NaiveDate,
    #[serde(default)]
    priority: TaskPriority,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    status: TaskStatus,
    created_at: DateTime<Utc>,
}

impl TaskDocument {
    fn into_task(self) -> Option<Task> {
        let id = self.id?;
        Some(Task {
            id: TaskId::new(id.to_hex()),
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            tags: self.tags,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

impl From<NewTask> for TaskDocument {
    fn from(task: NewTask) -> Self {
        Self {
            id: None,
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            tags: task.tags,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

fn storage(err: mongodb::error::Error) -> Error {
    Error::Storage(format!("MongoDB error: {}", err))
}

/// Parse a task id into an `ObjectId`; ids that are not valid hex cannot exist
fn object_id(id: &TaskId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

/// Task gateway over a MongoDB collection
#[derive(Clone)]
pub struct MongoTaskGateway {
    tasks: Collection<TaskDocument>,
}

impl MongoTaskGateway {
    /// Connect to `uri` and use the `tasks` collection of `database`
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await.map_err(storage)?;
        info!(database, "connected to MongoDB");
        Ok(Self {
            tasks: client.database(database).collection(TASKS_COLLECTION),
        })
    }
}

#[async_trait]
impl TaskGateway for MongoTaskGateway {
    async fn create(&self, task: NewTask) -> Result<Task> {
        let mut document = TaskDocument::from(task);
        let inserted = self.tasks.insert_one(&document).await.map_err(storage)?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Storage("Inserted task has no ObjectId".to_string()))?;
        document.id = Some(id);
        debug!(task_id = %id, "task document created");
        document
            .into_task()
            .ok_or_else(|| Error::Storage("Inserted task has no ObjectId".to_string()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>> {
        let cursor = self
            .tasks
            .find(doc! { "ownerId": owner_id })
            .await
            .map_err(storage)?;
        let documents: Vec<TaskDocument> = cursor.try_collect().await.map_err(storage)?;
        Ok(documents
            .into_iter()
            .filter_map(TaskDocument::into_task)
            .collect())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let Some(oid) = object_id(id) else {
            return Ok(None);
        };
        let document = self
            .tasks
            .find_one(doc! { "_id": oid })
            .await
            .map_err(storage)?;
        Ok(document.and_then(TaskDocument::into_task))
    }

    async fn update(&self, task: Task) -> Result<()> {
        let oid = object_id(&task.id).ok_or_else(|| Error::TaskNotFound(task.id.to_string()))?;
        let replacement = TaskDocument {
            id: Some(oid),
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            tags: task.tags,
            status: task.status,
            created_at: task.created_at,
        };
        let result = self
            .tasks
            .replace_one(doc! { "_id": oid }, &replacement)
            .await
            .map_err(storage)?;
        if result.matched_count == 0 {
            return Err(Error::TaskNotFound(task.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<bool> {
        let Some(oid) = object_id(id) else {
            return Ok(false);
        };
        let result = self
            .tasks
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(storage)?;
        Ok(result.deleted_count > 0)
    }

    async fn mark_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let oid = object_id(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let result = self
            .tasks
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await
            .map_err(storage)?;
        if result.matched_count == 0 {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_where(&self, owner_id: &str, status: TaskStatus) -> Result<u64> {
        let result = self
            .tasks
            .delete_many(doc! { "ownerId": owner_id, "status": status.as_str() })
            .await
            .map_err(storage)?;
        debug!(owner_id, %status, removed = result.deleted_count, "bulk delete");
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    #[test]
    fn documents_need_an_object_id() {
        let new_task = TaskDraft::new("Stored").into_new_task("owner", Utc::now());
        let mut document = TaskDocument::from(new_task);
        assert!(document.id.is_none());
        assert!(TaskDocument::from(TaskDraft::new("x").into_new_task("o", Utc::now()))
            .into_task()
            .is_none());

        let oid = ObjectId::new();
        document.id = Some(oid);
        let task = document.into_task().unwrap();
        assert_eq!(task.id.as_str(), oid.to_hex());
        assert_eq!(task.owner_id, "owner");
    }

    #[test]
    fn only_hex_ids_parse() {
        let oid = ObjectId::new();
        assert_eq!(object_id(&TaskId::new(oid.to_hex())), Some(oid));
        assert_eq!(object_id(&TaskId::from("not-an-object-id")), None);
    }
}
