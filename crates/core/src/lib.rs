//! Core library for TaskNest
//!
//! This crate contains the task-management logic, including:
//! - Task model and persistence gateways
//! - Identity resolution and sign-in
//! - The per-identity task store and its filtered view
//! - View models for list, board and sidebar rendering

pub mod error;
pub mod identity;
pub mod store;
pub mod task;
pub mod view;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
