//! Dashboard view-model and the UI toggles that shape it

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::card::{CardLayout, TaskCard};
use super::sidebar::Sidebar;
use crate::identity::Identity;
use crate::store::{FilterCriteria, StoreSnapshot, TaskFilter};
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    List,
    #[default]
    Board,
}

impl ViewMode {
    pub fn layout(self) -> CardLayout {
        match self {
            Self::List => CardLayout::List,
            Self::Board => CardLayout::Board,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Modal {
    #[default]
    Closed,
    AddTask,
    EditTask {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
}

/// Presentation toggles kept per session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub modal: Modal,
    #[serde(default)]
    pub dark_mode: bool,
}

impl UiState {
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn open_add_task(&mut self) {
        self.modal = Modal::AddTask;
    }

    pub fn open_edit_task(&mut self, task_id: TaskId) {
        self.modal = Modal::EditTask { task_id };
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }
}

/// Heading shown above the cards for the active filter
pub fn filter_title(filter: TaskFilter) -> &'static str {
    match filter {
        TaskFilter::All => "All Tasks",
        TaskFilter::Today => "Today's Tasks",
        TaskFilter::Week => "This Week's Tasks",
        TaskFilter::Completed => "Completed Tasks",
        TaskFilter::Trash => "Trash",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub greeting: Option<String>,
    pub title: &'static str,
    pub criteria: FilterCriteria,
    pub view_mode: ViewMode,
    pub cards: Vec<TaskCard>,
    pub sidebar: Sidebar,
    pub loading: bool,
    pub ui: UiState,
    /// Task being edited, when the edit modal is open
    pub editing: Option<Task>,
}

impl Dashboard {
    pub fn new(
        identity: Option<&Identity>,
        snapshot: &StoreSnapshot,
        ui: &UiState,
        today: NaiveDate,
    ) -> Self {
        let layout = ui.view_mode.layout();
        let cards = snapshot
            .filtered_on(today)
            .iter()
            .map(|task| TaskCard::new(task, layout, today))
            .collect();
        let sidebar = Sidebar::new(
            &snapshot.criteria,
            &snapshot.counts_on(today),
            &snapshot.all_tags(),
        );
        let editing = match &ui.modal {
            Modal::EditTask { task_id } => {
                snapshot.tasks.iter().find(|t| &t.id == task_id).cloned()
            }
            _ => None,
        };

        Self {
            greeting: identity.map(|identity| format!("Hi, {}", identity.greeting_name())),
            title: filter_title(snapshot.criteria.filter),
            criteria: snapshot.criteria.clone(),
            view_mode: ui.view_mode,
            cards,
            sidebar,
            loading: snapshot.loading,
            ui: ui.clone(),
            editing,
        }
    }
}
