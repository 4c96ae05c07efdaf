//! Filter criteria and the derived task view
//!
//! Filtering is a pure function of the collection, the criteria and the
//! current date, applied in a fixed order: status filter, search, tag,
//! priority.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPriority, TaskStatus};
use crate::Error;

/// Width of the `week` window, inclusive of both ends
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// Sidebar filter selecting which lifecycle slice is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    All,
    Today,
    Week,
    Completed,
    Trash,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self::All
    }
}

impl TaskFilter {
    /// Every filter, in menu order
    pub const ALL: [TaskFilter; 5] = [
        TaskFilter::All,
        TaskFilter::Today,
        TaskFilter::Week,
        TaskFilter::Completed,
        TaskFilter::Trash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Completed => "completed",
            Self::Trash => "trash",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Completed => "Completed",
            Self::Trash => "Trash",
        }
    }

    /// Only the trash filter shows trashed tasks, even when they fall due
    /// today or this week.
    pub fn excludes_trash(self) -> bool {
        matches!(self, Self::All | Self::Today | Self::Week)
    }

    pub fn admits(self, task: &Task, today: NaiveDate) -> bool {
        if self.excludes_trash() && task.status == TaskStatus::Trash {
            return false;
        }
        match self {
            Self::All => true,
            Self::Today => task.due_date == today && task.status != TaskStatus::Completed,
            Self::Week => {
                let end = today + Duration::days(WEEK_WINDOW_DAYS);
                task.due_date >= today
                    && task.due_date <= end
                    && task.status != TaskStatus::Completed
            }
            Self::Completed => task.status == TaskStatus::Completed,
            Self::Trash => task.status == TaskStatus::Trash,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "completed" => Ok(Self::Completed),
            "trash" => Ok(Self::Trash),
            _ => Err(Error::InvalidInput(format!("Unknown filter '{}'", value))),
        }
    }
}

/// Everything that narrows the collection down to the derived view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub filter: TaskFilter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl FilterCriteria {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if !self.filter.admits(task, today) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !task.matches_search(&needle) {
            return false;
        }

        if let Some(tag) = self.tag.as_deref().filter(|tag| !tag.is_empty()) {
            if !task.has_tag(tag) {
                return false;
            }
        }

        match self.priority {
            Some(priority) => task.priority == priority,
            None => true,
        }
    }

    /// The derived view of `tasks`, in collection order
    pub fn apply(&self, tasks: &[Task], today: NaiveDate) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task, today))
            .cloned()
            .collect()
    }
}

/// How many tasks each sidebar filter would show, ignoring search/tag/priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCounts {
    pub all: usize,
    pub today: usize,
    pub week: usize,
    pub completed: usize,
    pub trash: usize,
}

impl FilterCounts {
    pub fn tally(tasks: &[Task], today: NaiveDate) -> Self {
        let count = |filter: TaskFilter| tasks.iter().filter(|t| filter.admits(t, today)).count();
        Self {
            all: count(TaskFilter::All),
            today: count(TaskFilter::Today),
            week: count(TaskFilter::Week),
            completed: count(TaskFilter::Completed),
            trash: count(TaskFilter::Trash),
        }
    }

    pub fn get(&self, filter: TaskFilter) -> usize {
        match filter {
            TaskFilter::All => self.all,
            TaskFilter::Today => self.today,
            TaskFilter::Week => self.week,
            TaskFilter::Completed => self.completed,
            TaskFilter::Trash => self.trash,
        }
    }
}
