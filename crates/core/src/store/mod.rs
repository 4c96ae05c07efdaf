//! Task store module
//!
//! The signed-in identity's collection, filter criteria, sync policy and
//! busy tracking.

mod busy;
mod criteria;
mod sync;
mod task_store;

pub use busy::{BusyGuard, BusyTracker};
pub use criteria::{FilterCounts, FilterCriteria, TaskFilter, WEEK_WINDOW_DAYS};
pub use sync::{Applied, Mutation, SyncStrategy};
pub use task_store::{StoreSnapshot, TaskStore};
