//! Session-scoped persistence of the wallet snapshot.

use crate::{
    normalize::normalize,
    snapshot::{RawChainId, RawWalletReport, WalletSnapshot},
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};

/// Name of the session value holding the serialized snapshot.
pub const WALLET_COOKIE: &str = "user-wallet";

/// A string key-value store bound to a single client session.
///
/// Implementations are handed to the [`SnapshotStore`] per call, which is how the snapshot gets
/// associated with a session without the store reading any ambient state.
pub trait SessionStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String);
    fn remove(&mut self, name: &str);
}

/// Why a persisted value could not be turned back into a snapshot.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("persisted wallet is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] crate::normalize::ValidationError),
}

/// Reads and writes the canonical snapshot under a fixed session value name.
///
/// Reads and writes both go through [`normalize`], so a tampered or stale value degrades to "no
/// wallet" instead of leaking into the rest of the application.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    name: String,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(WALLET_COOKIE)
    }
}

// Shape of the persisted value. The chain id must be numeric here, unlike in a raw report.
#[derive(Deserialize)]
struct PersistedWallet {
    address: String,
    #[serde(rename = "chainId")]
    chain_id: i128,
}

impl SnapshotStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name of the session value this store manages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the persisted snapshot, or `None` if it is absent or fails validation.
    pub fn load(&self, session: &dyn SessionStore) -> Option<WalletSnapshot> {
        let value = session.get(&self.name).filter(|value| !value.is_empty())?;
        match Self::decode(&value) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                debug!(name = %self.name, %err, "ignoring corrupt persisted wallet");
                None
            }
        }
    }

    /// Persists `snapshot`, overwriting any previous value.
    pub fn save(&self, session: &mut dyn SessionStore, snapshot: &WalletSnapshot) {
        // Serializing two plain fields cannot fail.
        let value = serde_json::to_string(snapshot).unwrap_or_default();
        trace!(name = %self.name, %value, "saving wallet");
        session.set(&self.name, value);
    }

    /// Removes the persisted value. Removing an absent value is a no-op.
    pub fn clear(&self, session: &mut dyn SessionStore) {
        trace!(name = %self.name, "clearing wallet");
        session.remove(&self.name);
    }

    /// Write path for untrusted candidates: saves the normalized snapshot, or clears the value if
    /// there is no candidate or it fails validation. Never persists partial data.
    pub fn sync(
        &self,
        session: &mut dyn SessionStore,
        candidate: Option<&RawWalletReport>,
    ) -> Option<WalletSnapshot> {
        match candidate.map(normalize) {
            Some(Ok(snapshot)) => {
                self.save(session, &snapshot);
                Some(snapshot)
            }
            Some(Err(err)) => {
                debug!(%err, "rejected wallet report");
                self.clear(session);
                None
            }
            None => {
                self.clear(session);
                None
            }
        }
    }

    fn decode(value: &str) -> Result<WalletSnapshot, StoreError> {
        let persisted: PersistedWallet = serde_json::from_str(value)?;
        let raw = RawWalletReport {
            address: persisted.address,
            chain_id: RawChainId::Number(persisted.chain_id),
        };
        Ok(normalize(&raw)?)
    }
}

/// Session key identifying one client.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey(pub String);

impl From<String> for SessionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// In-process session storage, keyed by [`SessionKey`].
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, HashMap<String, String>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle bound to `key`.
    pub fn session(&self, key: impl Into<SessionKey>) -> MemorySession {
        MemorySession { key: key.into(), sessions: self.sessions.clone() }
    }

    /// Raw value stored for `key`, bypassing validation.
    pub fn raw(&self, key: &SessionKey, name: &str) -> Option<String> {
        self.sessions.lock().get(key).and_then(|values| values.get(name).cloned())
    }
}

/// A [`MemorySessionStore`] handle for a single session.
#[derive(Clone, Debug)]
pub struct MemorySession {
    key: SessionKey,
    sessions: Arc<Mutex<HashMap<SessionKey, HashMap<String, String>>>>,
}

impl MemorySession {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }
}

impl SessionStore for MemorySession {
    fn get(&self, name: &str) -> Option<String> {
        self.sessions.lock().get(&self.key).and_then(|values| values.get(name).cloned())
    }

    fn set(&mut self, name: &str, value: String) {
        self.sessions.lock().entry(self.key.clone()).or_default().insert(name.to_string(), value);
    }

    fn remove(&mut self, name: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(values) = sessions.get_mut(&self.key) {
            values.remove(name);
            if values.is_empty() {
                sessions.remove(&self.key);
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use alloy_primitives::Address;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_saved_snapshot_loads_back(bytes in any::<[u8; 20]>(), chain_id in 1u64..) {
            let sessions = MemorySessionStore::new();
            let mut session = sessions.session("a");
            let store = SnapshotStore::default();
            let snapshot = WalletSnapshot::new(Address::from(bytes), chain_id).unwrap();

            store.save(&mut session, &snapshot);
            prop_assert_eq!(store.load(&session), Some(snapshot));
        }
    }
}
