//! Identity module
//!
//! Sign-in, sign-out and the resolved identity the task store is scoped to.

mod adapter;
mod directory;
mod local;
mod model;
mod provider;

pub use adapter::IdentityAdapter;
pub use directory::{
    DirectorySettings, UserDirectory, DEFAULT_JWT_SECRET, DEFAULT_TOKEN_TTL_SECONDS,
};
pub use local::LocalIdentityProvider;
pub use model::*;
pub use provider::IdentityProvider;
