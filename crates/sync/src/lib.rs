//! # wallet-sync
//!
//! Reconciles the connection state of a browser-injected wallet (account address, chain id) with
//! server-side session state, so server handlers can decide "is a wallet connected, and to which
//! chain" without client-only rendering.
//!
//! ## Architecture
//!
//! 1. [`normalize()`] validates an untrusted [`RawWalletReport`] into a [`WalletSnapshot`]
//! 2. [`SnapshotStore`] persists the snapshot in a [`SessionStore`], re-validating on read
//! 3. [`ReconciliationController`] watches the selected [`WalletProvider`] and commits updates
//! 4. an [`Invalidator`] is signalled once per status transition so dependent views re-render

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod controller;
pub mod invalidate;
pub mod normalize;
pub mod provider;
pub mod snapshot;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::SyncConfig;
pub use controller::{
    Availability, ControllerHandle, ControllerState, ReconciliationController, WalletStatus,
};
pub use invalidate::{InvalidationScope, Invalidator, RevalidationRegistry, ScopeKind};
pub use normalize::{AddressError, ChainIdError, ValidationError, normalize, short_hex};
pub use provider::{
    EnvironmentProbe, Injected, ProviderError, ProviderEvent, ProviderFlags, StaticProbe,
    WalletProvider, select_provider,
};
pub use snapshot::{RawChainId, RawWalletReport, WalletSnapshot};
pub use store::{MemorySessionStore, SessionKey, SessionStore, SnapshotStore, WALLET_COOKIE};
