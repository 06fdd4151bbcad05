//! API server lifecycle: bind → spawn background task → return a handle
//! with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Shut down the server gracefully. In-flight requests are allowed to
    /// finish. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve `api_router` in a background tokio task.
///
/// Port 0 picks an ephemeral port; the bound address is in `ApiServer::addr`.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_core(dir: &tempfile::TempDir) -> Arc<CoreState> {
        let db_path = dir.path().join("clinic.db").to_string_lossy().to_string();
        let settings = Settings::from_lookup(|key| match key {
            "JWT_SECRET" => Some("server-test-secret".to_string()),
            "DATABASE_URL" => Some(db_path.clone()),
            _ => None,
        })
        .unwrap();
        let core = Arc::new(CoreState::new(settings));
        core.prepare_database().unwrap();
        core
    }

    fn localhost() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost())
            .await
            .expect("server should start");

        assert!(server.addr.port() > 0);

        let url = format!("http://{}/health", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn server_serves_api_routes() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost())
            .await
            .expect("server should start");
        let base = format!("http://{}", server.addr);

        let resp = reqwest::get(format!("{base}/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = reqwest::get(format!("{base}/patients")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        let resp = reqwest::Client::new()
            .post(format!("{base}/auth/login"))
            .header("Content-Type", "application/json")
            .body(r#"{"email":"nobody@clinic.test","password":"x"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost())
            .await
            .expect("server should start");

        server.shutdown();
        server.shutdown(); // Second call should be safe
    }
}
