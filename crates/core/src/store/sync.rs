//! Mutations and how the local collection catches up with each of them

use crate::task::{NewTask, Task, TaskId, TaskStatus};

/// How the local collection is brought back in line after a remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Apply the same change to the local collection without a round trip
    LocalPatch,
    /// Re-read the owner's whole collection from the gateway
    FullResync,
}

/// A write against the persistence gateway
#[derive(Debug, Clone)]
pub enum Mutation {
    Add(NewTask),
    /// Replace a task; `previous` is the status it had before the edit
    Update { task: Task, previous: TaskStatus },
    Complete(TaskId),
    Trash(TaskId),
    Restore(TaskId),
    Delete(TaskId),
    EmptyTrash,
}

impl Mutation {
    /// Status changes and bulk deletes resync; everything else patches locally.
    ///
    /// An edit that also moves the task to another status counts as a status
    /// change.
    pub fn strategy(&self) -> SyncStrategy {
        match self {
            Self::Update { task, previous } if task.status != *previous => {
                SyncStrategy::FullResync
            }
            Self::Add(_) | Self::Update { .. } | Self::Delete(_) => SyncStrategy::LocalPatch,
            Self::Complete(_) | Self::Trash(_) | Self::Restore(_) | Self::EmptyTrash => {
                SyncStrategy::FullResync
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add_task",
            Self::Update { .. } => "update_task",
            Self::Complete(_) => "complete_task",
            Self::Trash(_) => "trash_task",
            Self::Restore(_) => "restore_task",
            Self::Delete(_) => "delete_task",
            Self::EmptyTrash => "empty_trash",
        }
    }
}

/// What changed, as far as the local collection is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Created(Task),
    Updated(Task),
    Deleted(TaskId),
    StatusChanged(TaskId, TaskStatus),
    Purged(u64),
}

impl Applied {
    /// The task a create or update produced
    pub fn into_task(self) -> Option<Task> {
        match self {
            Self::Created(task) | Self::Updated(task) => Some(task),
            _ => None,
        }
    }

    pub fn purged(&self) -> u64 {
        match self {
            Self::Purged(count) => *count,
            _ => 0,
        }
    }
}
