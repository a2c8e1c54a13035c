//! Process bootstrap: schema first, then the listener.

use crate::api::{AppState, SharedState, router};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::IncidentStore;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Open the store described by `config` and make sure its schema exists.
pub async fn prepare_store(config: &ServerConfig) -> Result<IncidentStore> {
    let store = IncidentStore::from_config(config);
    store.blocking(|s| s.init_schema()).await?;
    info!(path = %store.path().display(), "Database ready");
    Ok(store)
}

/// Serve requests on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, store: IncidentStore, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state: SharedState = Arc::new(AppState::new(store));
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Initialize the schema, bind the configured address and serve.
///
/// The listener is only bound after the schema exists, so no request can
/// arrive before the table does.
pub async fn run<F>(config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = prepare_store(config).await?;
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    serve(listener, store, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepare_store_creates_database() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            database_path: dir.path().join("incidents.db"),
            ..ServerConfig::default()
        };
        let store = prepare_store(&config).await.unwrap();
        assert!(config.database_path.exists());
        assert!(store.list(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            database_path: dir.path().join("incidents.db"),
            ..ServerConfig::default()
        };
        let store = prepare_store(&config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, store, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
