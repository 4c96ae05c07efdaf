//! Identity provider trait
//!
//! The seam between the application and whatever service authenticates users.

use async_trait::async_trait;

use super::model::{Credentials, Identity, Registration, Session};
use crate::Result;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the identity of the current session, if any
    async fn current(&self) -> Result<Option<Identity>>;

    /// Interactive sign-in
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// Create an account and sign it in
    async fn sign_up(&self, registration: &Registration) -> Result<Session>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;
}
