//! Per-identity sessions
//!
//! Every signed-in identity gets its own identity adapter, task store and UI
//! state. Sessions are keyed by uid and rebuilt from a bearer token after a
//! restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tasknest_core::identity::{
    Credentials, IdentityAdapter, IdentityProvider, LocalIdentityProvider, Registration, Session,
    UserDirectory,
};
use tasknest_core::store::TaskStore;
use tasknest_core::task::TaskGateway;
use tasknest_core::view::UiState;
use tasknest_core::{Error, Result};

pub struct UserSession {
    provider: Arc<LocalIdentityProvider>,
    identity: IdentityAdapter,
    store: Arc<TaskStore>,
    ui: RwLock<UiState>,
    watcher: JoinHandle<()>,
}

impl UserSession {
    fn new(directory: Arc<UserDirectory>, gateway: Arc<dyn TaskGateway>) -> Self {
        let provider = Arc::new(LocalIdentityProvider::new(directory));
        let identity = IdentityAdapter::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);
        let store = Arc::new(TaskStore::new(gateway, identity.clone()));
        let watcher = store.watch_identity();

        Self {
            provider,
            identity,
            store,
            ui: RwLock::new(UiState::default()),
            watcher,
        }
    }

    pub fn identity(&self) -> &IdentityAdapter {
        &self.identity
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub async fn ui(&self) -> UiState {
        self.ui.read().await.clone()
    }

    pub async fn set_ui(&self, ui: UiState) -> UiState {
        let mut current = self.ui.write().await;
        *current = ui;
        current.clone()
    }
}

impl Drop for UserSession {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

pub struct SessionRegistry {
    directory: Arc<UserDirectory>,
    gateway: Arc<dyn TaskGateway>,
    sessions: RwLock<HashMap<String, Arc<UserSession>>>,
    /// Tokens that were signed out before they expired, with their expiry.
    /// Entries are dropped once the token would be rejected anyway.
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new(directory: Arc<UserDirectory>, gateway: Arc<dyn TaskGateway>) -> Self {
        Self {
            directory,
            gateway,
            sessions: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    fn open(&self) -> UserSession {
        UserSession::new(Arc::clone(&self.directory), Arc::clone(&self.gateway))
    }

    pub async fn sign_up(&self, registration: &Registration) -> Result<(Session, Arc<UserSession>)> {
        let user = Arc::new(self.open());
        let session = user.identity.sign_up(registration).await?;
        self.activate(session, user).await
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(Session, Arc<UserSession>)> {
        let user = Arc::new(self.open());
        let session = user.identity.sign_in(credentials).await?;
        self.activate(session, user).await
    }

    /// Look up the session a bearer token belongs to
    pub async fn resolve(&self, token: &str) -> Result<(Session, Arc<UserSession>)> {
        if self.revoked.read().await.contains_key(token) {
            return Err(Error::Unauthorized("Session has been signed out".to_string()));
        }

        let session = self.directory.verify_session(token).await?;
        let uid = session.identity.uid.clone();
        if let Some(user) = self.sessions.read().await.get(&uid).cloned() {
            return Ok((session, user));
        }

        debug!(uid = %uid, "rebuilding session from token");
        let user = Arc::new(self.open());
        user.provider.restore_session(token).await?;
        user.identity.resolve().await?;
        user.store.load().await?;

        let mut sessions = self.sessions.write().await;
        let user = Arc::clone(sessions.entry(uid).or_insert(user));
        Ok((session, user))
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let (session, user) = self.resolve(token).await?;
        user.identity.sign_out().await?;
        user.store.clear().await;

        let mut revoked = self.revoked.write().await;
        let now = Utc::now();
        revoked.retain(|_, expires_at| *expires_at > now);
        revoked.insert(token.to_string(), session.expires_at);
        drop(revoked);

        self.sessions.write().await.remove(&session.identity.uid);
        info!(uid = %session.identity.uid, "session signed out");
        Ok(())
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn activate(
        &self,
        session: Session,
        user: Arc<UserSession>,
    ) -> Result<(Session, Arc<UserSession>)> {
        user.store.load().await?;
        self.sessions
            .write()
            .await
            .insert(session.identity.uid.clone(), Arc::clone(&user));
        info!(uid = %session.identity.uid, "session opened");
        Ok((session, user))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use tasknest_core::identity::DirectorySettings;
    use tasknest_core::task::{FileTaskGateway, TaskDraft};

    async fn registry() -> (SessionRegistry, TempDir) {
        let temp = TempDir::new().unwrap();
        let directory = UserDirectory::open(temp.path().to_path_buf(), DirectorySettings::default())
            .await
            .unwrap();
        let gateway = FileTaskGateway::new(temp.path().join("tasks.json"))
            .await
            .unwrap();
        (
            SessionRegistry::new(Arc::new(directory), Arc::new(gateway)),
            temp,
        )
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "long-enough-pw".to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn sign_up_opens_a_loaded_session() {
        let (registry, _temp) = registry().await;
        let (session, user) = registry.sign_up(&registration("a@example.com")).await.unwrap();

        assert_eq!(user.identity().owner_id().unwrap(), session.identity.uid);
        assert_eq!(
            user.store().loaded_owner().await,
            Some(session.identity.uid.clone())
        );
        assert_eq!(registry.active_sessions().await, 1);
    }

    #[tokio::test]
    async fn token_rebuilds_session_with_existing_tasks() {
        let (registry, _temp) = registry().await;
        let (session, user) = registry.sign_up(&registration("a@example.com")).await.unwrap();
        user.store().add_task(TaskDraft::new("Remember me")).await.unwrap();

        registry.sessions.write().await.clear();
        let (_, rebuilt) = registry.resolve(&session.token).await.unwrap();
        let tasks = rebuilt.store().tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Remember me");
    }

    #[tokio::test]
    async fn signed_out_token_is_rejected() {
        let (registry, _temp) = registry().await;
        let (session, _user) = registry.sign_up(&registration("a@example.com")).await.unwrap();

        registry.sign_out(&session.token).await.unwrap();
        assert_eq!(registry.active_sessions().await, 0);
        assert!(matches!(
            registry.resolve(&session.token).await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn expired_revocations_are_pruned() {
        let (registry, _temp) = registry().await;
        registry.revoked.write().await.insert(
            "stale-token".to_string(),
            Utc::now() - chrono::Duration::minutes(5),
        );
        let (session, _user) = registry.sign_up(&registration("a@example.com")).await.unwrap();

        registry.sign_out(&session.token).await.unwrap();
        let revoked = registry.revoked.read().await;
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked.get(&session.token), Some(&session.expires_at));
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_identity() {
        let (registry, _temp) = registry().await;
        let (_, alice) = registry.sign_up(&registration("alice@example.com")).await.unwrap();
        let (_, bob) = registry.sign_up(&registration("bob@example.com")).await.unwrap();

        alice.store().add_task(TaskDraft::new("Alice only")).await.unwrap();
        bob.store().load().await.unwrap();
        assert!(bob.store().tasks().await.is_empty());
    }
}
