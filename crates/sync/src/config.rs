//! Layered configuration.
//!
//! Values are resolved, lowest priority first, from [`SyncConfig::default`], the
//! `wallet-sync.toml` file (or the file named by `WALLET_SYNC_CONFIG`), `WALLET_SYNC_*`
//! environment variables and finally whatever providers the caller merges on top, such as
//! command line arguments.

use crate::store::{SnapshotStore, WALLET_COOKIE};
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

/// Settings shared by the session store and the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Name of the session cookie holding the wallet snapshot.
    pub cookie_name: String,
    /// Whether the cookie is only sent over HTTPS.
    pub cookie_secure: bool,
    /// Lifetime of the cookie. Session cookie when unset.
    pub cookie_max_age_secs: Option<u64>,
    /// Interface the server binds to.
    pub host: IpAddr,
    /// Port the server binds to. `0` picks a free port.
    pub port: u16,
    /// Where protected routes redirect to without a connected wallet.
    pub home_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cookie_name: WALLET_COOKIE.to_string(),
            cookie_secure: false,
            cookie_max_age_secs: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            home_path: "/".to_string(),
        }
    }
}

impl SyncConfig {
    /// Default configuration file name.
    pub const FILE_NAME: &'static str = "wallet-sync.toml";

    /// Prefix of the environment variables read into the config.
    pub const ENV_PREFIX: &'static str = "WALLET_SYNC_";

    /// Returns the default figment: defaults, the config file and the environment.
    pub fn figment() -> Figment {
        let file = std::env::var_os("WALLET_SYNC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME));
        Self::figment_with_file(file)
    }

    /// Like [`figment`](Self::figment) with an explicit config file.
    pub fn figment_with_file(file: impl AsRef<Path>) -> Figment {
        Figment::from(Self::default())
            .merge(Toml::file(file.as_ref()))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["CONFIG"]))
    }

    /// Loads the config from the default figment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::try_from(Self::figment())
    }

    /// Extracts a config from `provider`.
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, figment::Error> {
        let config: Self = Figment::from(provider).extract()?;
        trace!(?config, "loaded config");
        Ok(config)
    }

    /// The address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A snapshot store reading and writing the configured cookie.
    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(self.cookie_name.clone())
    }
}

impl Provider for SyncConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("wallet-sync config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
