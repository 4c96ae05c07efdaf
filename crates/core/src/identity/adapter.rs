//! Identity adapter
//!
//! Wraps an [`IdentityProvider`] and publishes the resolved session over a
//! watch channel so the task store can follow sign-in and sign-out.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::model::{Credentials, Identity, Registration, Session, SessionState};
use super::provider::IdentityProvider;
use crate::{Error, Result};

#[derive(Clone)]
pub struct IdentityAdapter {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
}

impl IdentityAdapter {
    /// Create an adapter that is still resolving its identity
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::resolving());
        Self {
            provider,
            state: Arc::new(state),
        }
    }

    /// Ask the provider for the current identity and publish it.
    ///
    /// Resolution counts as finished even when the provider fails.
    pub async fn resolve(&self) -> Result<Option<Identity>> {
        match self.provider.current().await {
            Ok(identity) => {
                self.publish(identity.clone());
                Ok(identity)
            }
            Err(err) => {
                error!("identity resolution failed: {}", err);
                self.publish(None);
                Err(err)
            }
        }
    }

    /// Interactive sign-in. Errors are returned to the caller untouched.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let session = self.provider.sign_in(credentials).await?;
        info!(uid = %session.identity.uid, "identity signed in");
        self.publish(Some(session.identity.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, registration: &Registration) -> Result<Session> {
        let session = self.provider.sign_up(registration).await?;
        info!(uid = %session.identity.uid, "identity registered");
        self.publish(Some(session.identity.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.publish(None);
        Ok(())
    }

    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn session_state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every session change from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The uid to scope queries with, once an identity is resolved
    pub fn owner_id(&self) -> Result<String> {
        self.state
            .borrow()
            .ready_identity()
            .map(|identity| identity.uid.clone())
            .ok_or(Error::NotSignedIn)
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state.send_replace(SessionState::resolved(identity));
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;

    /// Provider with a scripted identity
    struct FixedProvider {
        identity: Mutex<Option<Identity>>,
    }

    fn alice() -> Identity {
        Identity {
            uid: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: Some("Alice".to_string()),
        }
    }

    fn session_for(identity: Identity) -> Session {
        Session {
            token: "token".to_string(),
            expires_at: chrono::Utc::now(),
            identity,
        }
    }

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn current(&self) -> Result<Option<Identity>> {
            Ok(self.identity.lock().await.clone())
        }

        async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
            if credentials.password != "letmein!" {
                return Err(Error::Unauthorized("Invalid credentials".to_string()));
            }
            *self.identity.lock().await = Some(alice());
            Ok(session_for(alice()))
        }

        async fn sign_up(&self, _registration: &Registration) -> Result<Session> {
            *self.identity.lock().await = Some(alice());
            Ok(session_for(alice()))
        }

        async fn sign_out(&self) -> Result<()> {
            *self.identity.lock().await = None;
            Ok(())
        }
    }

    fn adapter_with(identity: Option<Identity>) -> IdentityAdapter {
        IdentityAdapter::new(Arc::new(FixedProvider {
            identity: Mutex::new(identity),
        }))
    }

    #[tokio::test]
    async fn loading_until_first_resolution() {
        let adapter = adapter_with(Some(alice()));
        assert!(adapter.is_loading());
        assert!(matches!(adapter.owner_id(), Err(Error::NotSignedIn)));

        adapter.resolve().await.unwrap();
        assert!(!adapter.is_loading());
        assert_eq!(adapter.owner_id().unwrap(), "alice");
    }

    #[tokio::test]
    async fn resolved_without_identity() {
        let adapter = adapter_with(None);
        assert_eq!(adapter.resolve().await.unwrap(), None);
        assert!(!adapter.is_loading());
        assert!(adapter.current().is_none());
    }

    #[tokio::test]
    async fn sign_in_error_propagates() {
        let adapter = adapter_with(None);
        adapter.resolve().await.unwrap();

        let result = adapter
            .sign_in(&Credentials {
                email: "alice@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(adapter.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_sign_in_and_sign_out() {
        let adapter = adapter_with(None);
        let mut rx = adapter.subscribe();

        adapter
            .sign_in(&Credentials {
                email: "alice@example.com".to_string(),
                password: "letmein!".to_string(),
            })
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().identity, Some(alice()));

        adapter.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().identity, None);
    }
}
