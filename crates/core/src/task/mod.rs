//! Task module
//!
//! This module contains the task model and the persistence gateways.

mod file_store;
mod gateway;
mod model;
#[cfg(feature = "mongo")]
mod mongo_store;

pub use file_store::FileTaskGateway;
pub use gateway::TaskGateway;
pub use model::*;
#[cfg(feature = "mongo")]
pub use mongo_store::MongoTaskGateway;
