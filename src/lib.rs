use std::net::SocketAddr;
use std::sync::Arc;

pub mod adapters;
pub mod agent;
pub mod app;
mod assets;
pub mod config;
pub mod error;
pub mod ports;
pub mod push;
pub mod service;
pub mod state;
pub mod store;
mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use app::app;
pub use error::{ServeError, ServiceError};
pub use push::{VapidCredentials, generate_vapid_credentials};

/// Opens the store named by the config, or an in-memory one, and serves
/// the app until the listener fails.
pub async fn serve(addr: SocketAddr, config: config::AppConfig) -> Result<(), ServeError> {
    let store = match config.data_dir.as_deref() {
        Some(dir) => store::Store::open(dir)?,
        None => {
            tracing::warn!("no data directory configured, tasks and subscriptions are kept in memory");
            store::Store::in_memory()
        }
    };
    let router = app(config, Arc::new(store))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(%addr, "listening on http://{addr}");
    axum::serve(listener, router).await.map_err(ServeError::Serve)
}
