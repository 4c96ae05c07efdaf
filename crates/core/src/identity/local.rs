//! Identity provider backed by the local user directory

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::directory::UserDirectory;
use super::model::{Credentials, Identity, Registration, Session};
use super::provider::IdentityProvider;
use crate::Result;

/// One client's view of the directory: at most one active session
pub struct LocalIdentityProvider {
    directory: Arc<UserDirectory>,
    session: RwLock<Option<Session>>,
}

impl LocalIdentityProvider {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self {
            directory,
            session: RwLock::new(None),
        }
    }

    /// Adopt a previously issued token as the active session
    pub async fn restore_session(&self, token: &str) -> Result<Session> {
        let session = self.directory.verify_session(token).await?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn current(&self) -> Result<Option<Identity>> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.token.clone(),
            None => return Ok(None),
        };

        match self.directory.verify_session(&token).await {
            Ok(session) => Ok(Some(session.identity)),
            Err(err) => {
                warn!("dropping stale session: {}", err);
                *self.session.write().await = None;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let identity = self.directory.authenticate(credentials).await?;
        let session = self.directory.issue_session(identity)?;
        debug!(uid = %session.identity.uid, "signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, registration: &Registration) -> Result<Session> {
        let identity = self.directory.register(registration).await?;
        let session = self.directory.issue_session(identity)?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.session.write().await.take() {
            debug!(uid = %session.identity.uid, "signed out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::identity::DirectorySettings;
    use crate::Error;

    async fn build_provider() -> (LocalIdentityProvider, Arc<UserDirectory>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let directory = Arc::new(
            UserDirectory::open(temp_dir.path().to_path_buf(), DirectorySettings::default())
                .await
                .unwrap(),
        );
        (
            LocalIdentityProvider::new(Arc::clone(&directory)),
            directory,
            temp_dir,
        )
    }

    fn registration() -> Registration {
        Registration {
            email: "sam@example.com".to_string(),
            password: "correct-horse".to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn no_session_until_sign_in() {
        let (provider, _directory, _temp) = build_provider().await;
        assert!(provider.current().await.unwrap().is_none());

        let session = provider.sign_up(&registration()).await.unwrap();
        let current = provider.current().await.unwrap();
        assert_eq!(current, Some(session.identity));
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let (provider, _directory, _temp) = build_provider().await;
        provider.sign_up(&registration()).await.unwrap();
        provider.sign_out().await.unwrap();
        assert!(provider.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_session_on_fresh_provider() {
        let (provider, directory, _temp) = build_provider().await;
        let session = provider.sign_up(&registration()).await.unwrap();

        let other = LocalIdentityProvider::new(directory);
        let restored = other.restore_session(&session.token).await.unwrap();
        assert_eq!(restored.identity, session.identity);
        assert_eq!(other.current().await.unwrap(), Some(session.identity));
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_no_session() {
        let (provider, _directory, _temp) = build_provider().await;
        provider.sign_up(&registration()).await.unwrap();
        provider.sign_out().await.unwrap();

        let result = provider
            .sign_in(&Credentials {
                email: "sam@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(provider.session().await.is_none());
    }
}
