//! API server for TaskNest
//!
//! Hosts one task store per signed-in identity and exposes it as a JSON API.

mod config;
mod error;
mod routes;
mod sessions;
mod state;

use std::net::SocketAddr;
#[cfg(feature = "mongo")]
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Backend, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tasknest_server=debug,tasknest_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Using data directory: {:?}", config.data_dir);
    if config.uses_default_secret() {
        tracing::warn!("TASKNEST_JWT_SECRET is not set, using the development secret");
    }

    let app_state = open_state(&config)
        .await
        .context("Failed to initialize application state")?;

    let mut app = routes::router()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());
    if config.cors_any {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("REST API listening on {} ({} backend)", addr, config.backend.name());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let settings = config.directory_settings();
    match &config.backend {
        Backend::File => Ok(AppState::new(config.data_dir.clone(), settings).await?),
        #[cfg(feature = "mongo")]
        Backend::Mongo { uri, database } => {
            let gateway = tasknest_core::task::MongoTaskGateway::connect(uri, database)
                .await
                .context("Failed to connect to MongoDB")?;
            tracing::info!("Connected to MongoDB database {}", database);
            let gateway: Arc<dyn tasknest_core::task::TaskGateway> = Arc::new(gateway);
            Ok(AppState::with_gateway(config.data_dir.clone(), settings, gateway, "mongo").await?)
        }
        #[cfg(not(feature = "mongo"))]
        Backend::Mongo { .. } => {
            anyhow::bail!("TASKNEST_BACKEND=mongo requires the `mongo` feature")
        }
    }
}
