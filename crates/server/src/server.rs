use crate::{error::ServerError, router::build_router, state::ServerState};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use wallet_sync::SyncConfig;

/// The wallet sync HTTP server.
#[derive(Debug)]
pub struct WalletSyncServer {
    config: SyncConfig,
    state: Arc<ServerState>,
    local_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl WalletSyncServer {
    pub fn new(config: SyncConfig) -> Self {
        let state = Arc::new(ServerState::new(config.clone()));
        Self { config, state, local_addr: None, shutdown: CancellationToken::new(), task: None }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// The bound address while the server is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The bound port while running, the configured one otherwise.
    pub fn port(&self) -> u16 {
        self.local_addr.map_or(self.config.port, |addr| addr.port())
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Binds the configured address and serves in the background.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        if self.task.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let addr = self.config.socket_addr();
        let listener =
            TcpListener::bind(addr).await.map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let router = build_router(self.state.clone());
        let shutdown = CancellationToken::new();
        self.shutdown = shutdown.clone();
        self.task = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }));
        self.local_addr = Some(local_addr);

        info!(addr = %local_addr, "wallet sync server listening");
        Ok(())
    }

    /// Stops accepting connections and waits for in-flight requests to finish.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let task = self.task.take().ok_or(ServerError::NotRunning)?;
        self.shutdown.cancel();
        self.local_addr = None;
        task.await??;
        debug!("wallet sync server stopped");
        Ok(())
    }
}

impl Drop for WalletSyncServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
