//! View layer
//!
//! Pure view-models derived from a [`StoreSnapshot`](crate::store::StoreSnapshot).

mod card;
mod dashboard;
mod sidebar;

pub use card::{due_label, CardLayout, TaskCard, LIST_VISIBLE_TAGS};
pub use dashboard::{filter_title, Dashboard, Modal, UiState, ViewMode};
pub use sidebar::{FilterEntry, Sidebar, TagEntry};
