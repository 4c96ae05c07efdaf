//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use tasknest_core::identity::{DirectorySettings, UserDirectory};
use tasknest_core::task::{FileTaskGateway, TaskGateway};

use crate::sessions::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    data_dir: PathBuf,
    backend: &'static str,
    sessions: SessionRegistry,
}

impl AppState {
    /// State backed by the JSON task file under `data_dir`
    pub async fn new(data_dir: PathBuf, settings: DirectorySettings) -> tasknest_core::Result<Self> {
        let gateway = FileTaskGateway::new(data_dir.join("tasks.json")).await?;
        Self::with_gateway(data_dir, settings, Arc::new(gateway), "file").await
    }

    pub async fn with_gateway(
        data_dir: PathBuf,
        settings: DirectorySettings,
        gateway: Arc<dyn TaskGateway>,
        backend: &'static str,
    ) -> tasknest_core::Result<Self> {
        let directory = UserDirectory::open(data_dir.join("auth"), settings).await?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                data_dir,
                backend,
                sessions: SessionRegistry::new(Arc::new(directory), gateway),
            }),
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn backend(&self) -> &'static str {
        self.inner.backend
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }
}
