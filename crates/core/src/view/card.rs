//! Task cards for the list and board layouts

use chrono::NaiveDate;
use serde::Serialize;

use crate::task::{Task, TaskId, TaskPriority, TaskStatus};

/// Tags shown on a list row before the rest collapse into `+N`
pub const LIST_VISIBLE_TAGS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardLayout {
    List,
    Board,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCard {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub completed: bool,
    pub priority: TaskPriority,
    /// Short due label such as `Oct 19`
    pub due_label: String,
    pub overdue: bool,
    pub tags: Vec<String>,
    pub hidden_tags: usize,
}

impl TaskCard {
    pub fn new(task: &Task, layout: CardLayout, today: NaiveDate) -> Self {
        let visible = match layout {
            CardLayout::List => LIST_VISIBLE_TAGS.min(task.tags.len()),
            CardLayout::Board => task.tags.len(),
        };

        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            completed: task.status == TaskStatus::Completed,
            priority: task.priority,
            due_label: due_label(task.due_date),
            overdue: task.is_overdue(today),
            tags: task.tags[..visible].to_vec(),
            hidden_tags: task.tags.len() - visible,
        }
    }

    /// `+N` badge for collapsed tags
    pub fn more_tags_label(&self) -> Option<String> {
        (self.hidden_tags > 0).then(|| format!("+{}", self.hidden_tags))
    }
}

pub fn due_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
