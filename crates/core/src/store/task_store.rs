//! Task store
//!
//! Holds the signed-in identity's tasks, the filter criteria and the busy
//! flag. Every mutation goes through the gateway first and only then touches
//! the local collection, using the sync strategy the mutation declares.

use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::busy::BusyTracker;
use super::criteria::{FilterCounts, FilterCriteria, TaskFilter};
use super::sync::{Applied, Mutation, SyncStrategy};
use crate::identity::{IdentityAdapter, SessionState};
use crate::task::{normalize_tags, today, Task, TaskDraft, TaskGateway, TaskId, TaskPriority, TaskStatus};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct StoreState {
    /// Owner the collection was loaded for
    owner_id: Option<String>,
    tasks: Vec<Task>,
    criteria: FilterCriteria,
}

/// Point-in-time copy of everything the view layer renders from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    pub criteria: FilterCriteria,
    pub loading: bool,
}

impl StoreSnapshot {
    pub fn filtered_on(&self, today: NaiveDate) -> Vec<Task> {
        self.criteria.apply(&self.tasks, today)
    }

    pub fn counts_on(&self, today: NaiveDate) -> FilterCounts {
        FilterCounts::tally(&self.tasks, today)
    }

    pub fn all_tags(&self) -> Vec<String> {
        normalize_tags(self.tasks.iter().flat_map(|task| task.tags.iter()))
    }
}

pub struct TaskStore {
    gateway: Arc<dyn TaskGateway>,
    identity: IdentityAdapter,
    state: RwLock<StoreState>,
    busy: BusyTracker,
}

impl TaskStore {
    pub fn new(gateway: Arc<dyn TaskGateway>, identity: IdentityAdapter) -> Self {
        Self {
            gateway,
            identity,
            state: RwLock::new(StoreState::default()),
            busy: BusyTracker::new(),
        }
    }

    pub fn identity(&self) -> &IdentityAdapter {
        &self.identity
    }

    /// True while at least one operation is in flight
    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    /// Follow sign-in and sign-out on the identity adapter.
    ///
    /// The spawned task only holds a weak reference and ends once the store
    /// is dropped or the adapter goes away.
    pub fn watch_identity(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut sessions = self.identity.subscribe();

        tokio::spawn(async move {
            loop {
                let state = sessions.borrow_and_update().clone();
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.follow_session(&state).await;
                drop(store);

                if sessions.changed().await.is_err() {
                    break;
                }
            }
            debug!("identity watcher stopped");
        })
    }

    async fn follow_session(&self, session: &SessionState) {
        if session.loading {
            return;
        }
        match &session.identity {
            Some(identity) => {
                if self.loaded_owner().await.as_deref() == Some(identity.uid.as_str()) {
                    return;
                }
                // failures are logged by `load`
                let _ = self.load().await;
            }
            None => self.clear().await,
        }
    }

    /// Replace the collection with the current owner's tasks
    pub async fn load(&self) -> Result<usize> {
        self.run("load", async move {
            let owner_id = self.identity.owner_id()?;
            let count = self.resync(&owner_id).await?;
            info!(owner_id = %owner_id, count, "tasks loaded");
            Ok(count)
        })
        .await
    }

    /// Drop the collection and criteria, e.g. after sign-out
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        if let Some(owner_id) = state.owner_id.take() {
            debug!(owner_id = %owner_id, "task store cleared");
        }
        *state = StoreState::default();
    }

    pub async fn loaded_owner(&self) -> Option<String> {
        self.state.read().await.owner_id.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn find(&self, id: &TaskId) -> Option<Task> {
        let state = self.state.read().await;
        state.tasks.iter().find(|task| &task.id == id).cloned()
    }

    pub async fn filtered_tasks(&self) -> Vec<Task> {
        self.filtered_tasks_on(today()).await
    }

    pub async fn filtered_tasks_on(&self, today: NaiveDate) -> Vec<Task> {
        let state = self.state.read().await;
        state.criteria.apply(&state.tasks, today)
    }

    pub async fn filter_counts(&self) -> FilterCounts {
        self.filter_counts_on(today()).await
    }

    pub async fn filter_counts_on(&self, today: NaiveDate) -> FilterCounts {
        FilterCounts::tally(&self.state.read().await.tasks, today)
    }

    /// Every tag used by a loaded task, first occurrence first
    pub async fn all_tags(&self) -> Vec<String> {
        let state = self.state.read().await;
        normalize_tags(state.tasks.iter().flat_map(|task| task.tags.iter()))
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            tasks: state.tasks.clone(),
            criteria: state.criteria.clone(),
            loading: self.is_loading(),
        }
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.state.read().await.criteria.clone()
    }

    pub async fn set_criteria(&self, criteria: FilterCriteria) {
        let mut state = self.state.write().await;
        state.criteria = FilterCriteria {
            tag: criteria.tag.filter(|tag| !tag.trim().is_empty()),
            ..criteria
        };
    }

    pub async fn set_filter(&self, filter: TaskFilter) {
        self.state.write().await.criteria.filter = filter;
    }

    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.state.write().await.criteria.search = query.into();
    }

    pub async fn set_active_tag(&self, tag: Option<String>) {
        self.state.write().await.criteria.tag = tag.filter(|tag| !tag.trim().is_empty());
    }

    pub async fn set_active_priority(&self, priority: Option<TaskPriority>) {
        self.state.write().await.criteria.priority = priority;
    }

    /// Select `tag`, or clear it when it is already active.
    ///
    /// Picking a tag from the completed or trash view jumps back to all tasks.
    /// A blank tag changes nothing.
    pub async fn toggle_tag(&self, tag: &str) -> FilterCriteria {
        let mut state = self.state.write().await;
        let criteria = &mut state.criteria;
        let tag = tag.trim();
        if tag.is_empty() {
            return criteria.clone();
        }
        if criteria.tag.as_deref() == Some(tag) {
            criteria.tag = None;
        } else {
            criteria.tag = Some(tag.to_string());
            if matches!(criteria.filter, TaskFilter::Completed | TaskFilter::Trash) {
                criteria.filter = TaskFilter::All;
            }
        }
        criteria.clone()
    }

    pub async fn reset_criteria(&self) {
        self.state.write().await.criteria = FilterCriteria::default();
    }

    pub async fn add_task(&self, draft: TaskDraft) -> Result<Task> {
        self.run("add_task", async move {
            let owner_id = self.identity.owner_id()?;
            if draft.title.trim().is_empty() {
                return Err(Error::InvalidInput("Task title cannot be empty".to_string()));
            }

            let new_task = draft.into_new_task(owner_id.clone(), Utc::now());
            let task = self
                .apply(&owner_id, Mutation::Add(new_task))
                .await?
                .into_task()
                .ok_or_else(|| Error::Storage("Gateway returned no task".to_string()))?;
            info!(task_id = %task.id, "task added");
            Ok(task)
        })
        .await
    }

    /// Replace a task's editable fields. The owner and creation time are fixed.
    pub async fn update_task(&self, task: Task) -> Result<Task> {
        self.run("update_task", async move {
            let owner_id = self.identity.owner_id()?;
            let existing = self.owned_task(&owner_id, &task.id).await?;

            if task.title.trim().is_empty() {
                return Err(Error::InvalidInput("Task title cannot be empty".to_string()));
            }
            if task.owner_id != existing.owner_id {
                return Err(Error::InvalidInput("Task owner cannot change".to_string()));
            }
            if !existing.status.can_transition_to(task.status) {
                return Err(Error::InvalidTransition {
                    id: task.id.to_string(),
                    from: existing.status,
                    to: task.status,
                });
            }

            let task = Task {
                title: task.title.trim().to_string(),
                tags: normalize_tags(&task.tags),
                created_at: existing.created_at,
                ..task
            };
            let task = self
                .apply(
                    &owner_id,
                    Mutation::Update {
                        task,
                        previous: existing.status,
                    },
                )
                .await?
                .into_task()
                .ok_or_else(|| Error::Storage("Gateway returned no task".to_string()))?;
            info!(task_id = %task.id, "task updated");
            Ok(task)
        })
        .await
    }

    pub async fn complete_task(&self, id: &TaskId) -> Result<()> {
        self.transition(id, TaskStatus::Completed).await
    }

    pub async fn trash_task(&self, id: &TaskId) -> Result<()> {
        self.transition(id, TaskStatus::Trash).await
    }

    pub async fn restore_task(&self, id: &TaskId) -> Result<()> {
        self.transition(id, TaskStatus::Pending).await
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.run("delete_task", async move {
            let owner_id = self.identity.owner_id()?;
            self.owned_task(&owner_id, id).await?;
            self.apply(&owner_id, Mutation::Delete(id.clone())).await?;
            info!(task_id = %id, "task deleted");
            Ok(())
        })
        .await
    }

    /// Permanently delete every trashed task of the current owner
    pub async fn empty_trash(&self) -> Result<u64> {
        self.run("empty_trash", async move {
            let owner_id = self.identity.owner_id()?;
            let removed = self.apply(&owner_id, Mutation::EmptyTrash).await?.purged();
            info!(owner_id = %owner_id, removed, "trash emptied");
            Ok(removed)
        })
        .await
    }

    async fn transition(&self, id: &TaskId, target: TaskStatus) -> Result<()> {
        let mutation = match target {
            TaskStatus::Completed => Mutation::Complete(id.clone()),
            TaskStatus::Trash => Mutation::Trash(id.clone()),
            TaskStatus::Pending => Mutation::Restore(id.clone()),
        };

        self.run(mutation.name(), async move {
            let owner_id = self.identity.owner_id()?;
            let current = self.owned_task(&owner_id, id).await?;
            if !current.status.can_transition_to(target) {
                return Err(Error::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to: target,
                });
            }

            self.apply(&owner_id, mutation).await?;
            info!(task_id = %id, status = %target, "task status changed");
            Ok(())
        })
        .await
    }

    /// Hold a busy token for the whole operation and log its failure
    async fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _busy = self.busy.begin();
        let result = work.await;
        if let Err(err) = &result {
            error!(operation, "task operation failed: {}", err);
        }
        result
    }

    /// Write through the gateway, then sync the local collection
    async fn apply(&self, owner_id: &str, mutation: Mutation) -> Result<Applied> {
        let strategy = mutation.strategy();
        let operation = mutation.name();

        let applied = match mutation {
            Mutation::Add(new_task) => Applied::Created(self.gateway.create(new_task).await?),
            Mutation::Update { task, .. } => {
                self.gateway.update(task.clone()).await?;
                Applied::Updated(task)
            }
            Mutation::Complete(id) => self.mark(id, TaskStatus::Completed).await?,
            Mutation::Trash(id) => self.mark(id, TaskStatus::Trash).await?,
            Mutation::Restore(id) => self.mark(id, TaskStatus::Pending).await?,
            Mutation::Delete(id) => {
                if !self.gateway.delete(&id).await? {
                    debug!(task_id = %id, "task was already gone from the gateway");
                }
                Applied::Deleted(id)
            }
            Mutation::EmptyTrash => Applied::Purged(
                self.gateway
                    .delete_where(owner_id, TaskStatus::Trash)
                    .await?,
            ),
        };

        match strategy {
            SyncStrategy::LocalPatch => self.patch_local(owner_id, &applied).await?,
            SyncStrategy::FullResync => {
                self.resync(owner_id).await?;
            }
        }
        debug!(operation, ?strategy, "local collection synced");
        Ok(applied)
    }

    async fn mark(&self, id: TaskId, status: TaskStatus) -> Result<Applied> {
        self.gateway.mark_status(&id, status).await?;
        Ok(Applied::StatusChanged(id, status))
    }

    /// Patch the loaded collection in place. A collection that was never
    /// loaded is read in full instead, so it never holds a partial view.
    async fn patch_local(&self, owner_id: &str, applied: &Applied) -> Result<()> {
        let mut state = self.state.write().await;
        match state.owner_id.as_deref() {
            Some(loaded) if loaded != owner_id => {
                warn!(owner_id, loaded, "identity changed mid-operation, skipping local patch");
                return Ok(());
            }
            Some(_) => {}
            None => {
                drop(state);
                debug!(owner_id, "collection not loaded yet, resyncing instead of patching");
                self.resync(owner_id).await?;
                return Ok(());
            }
        }

        match applied {
            Applied::Created(task) => state.tasks.push(task.clone()),
            Applied::Updated(task) => {
                if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
            }
            Applied::Deleted(id) => state.tasks.retain(|t| &t.id != id),
            Applied::StatusChanged(..) | Applied::Purged(_) => {}
        }
        Ok(())
    }

    /// Re-read the owner's collection. Only ever queries `owner_id`.
    async fn resync(&self, owner_id: &str) -> Result<usize> {
        let mut tasks = self.gateway.list_by_owner(owner_id).await?;
        tasks.retain(|task| task.owner_id == owner_id);
        let count = tasks.len();

        if self.identity.current().map(|identity| identity.uid).as_deref() != Some(owner_id) {
            warn!(owner_id, "identity changed mid-operation, discarding resync");
            return Ok(count);
        }

        let mut state = self.state.write().await;
        if state.owner_id.as_deref().is_some_and(|loaded| loaded != owner_id) {
            state.criteria = FilterCriteria::default();
        }
        state.owner_id = Some(owner_id.to_string());
        state.tasks = tasks;
        Ok(count)
    }

    /// The owner's task with `id`, as currently held locally
    async fn owned_task(&self, owner_id: &str, id: &TaskId) -> Result<Task> {
        if id.is_blank() {
            return Err(Error::InvalidInput("Task id cannot be empty".to_string()));
        }
        let state = self.state.read().await;
        state
            .tasks
            .iter()
            .find(|task| &task.id == id && task.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }
}
