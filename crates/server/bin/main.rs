//! The `wallet-sync-server` binary.

#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::{Result, WrapErr};
use tokio::signal;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wallet_sync_server::{ServerArgs, WalletSyncServer};

fn install_handlers() {
    let panic_section = "This is a bug. Please report it with the output above.";
    let hooks = color_eyre::config::HookBuilder::default().panic_section(panic_section);
    if let Err(err) = hooks.install() {
        eprintln!("failed to install error hooks: {err}");
    }
}

fn init_subscriber() {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_handlers();
    init_subscriber();

    let args = ServerArgs::parse();
    let config = args.load_config().wrap_err("failed to load config")?;

    let mut server = WalletSyncServer::new(config);
    server.start().await?;
    if let Some(addr) = server.local_addr() {
        println!("Listening on http://{addr}");
    }

    shutdown_signal().await;
    info!("shutting down");
    server.stop().await?;
    Ok(())
}
