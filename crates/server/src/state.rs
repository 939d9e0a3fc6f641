use crate::{cookie::CookieAttributes, views::ViewCache};
use wallet_sync::{RevalidationRegistry, SessionStore, SnapshotStore, SyncConfig, WalletSnapshot};

/// State shared by every request handler.
#[derive(Debug)]
pub struct ServerState {
    config: SyncConfig,
    store: SnapshotStore,
    registry: RevalidationRegistry,
    views: ViewCache,
}

impl ServerState {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            store: config.store(),
            config,
            registry: RevalidationRegistry::new(),
            views: ViewCache::default(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Store for the wallet cookie.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Generations of the invalidated scopes.
    pub fn registry(&self) -> &RevalidationRegistry {
        &self.registry
    }

    /// The validated wallet of `session`, if any. Loaders call this instead of reading the
    /// cookie themselves.
    pub fn retrieve_connected_wallet(&self, session: &dyn SessionStore) -> Option<WalletSnapshot> {
        self.store.load(session)
    }

    pub fn views(&self) -> &ViewCache {
        &self.views
    }

    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes::from(&self.config)
    }
}
