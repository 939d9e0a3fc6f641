//! # wallet-sync-server
//!
//! The server half of wallet synchronization: the `POST /user-wallet` sync action the browser
//! calls after every reconciliation, a cookie-backed [`SessionStore`](wallet_sync::SessionStore)
//! and the views that read the connected wallet.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod args;
pub mod cookie;
pub mod error;
pub mod server;
pub mod state;
pub mod views;

// Used by the binary.
use color_eyre as _;
use eyre as _;
use tracing_subscriber as _;

mod handlers;
mod router;

pub use args::ServerArgs;
pub use cookie::{CookieAttributes, CookieSession};
pub use error::ServerError;
pub use router::build_router;
pub use server::WalletSyncServer;
pub use state::ServerState;
