use std::{io, net::SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("server is already running")]
    AlreadyRunning,
    #[error("server is not running")]
    NotRunning,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
