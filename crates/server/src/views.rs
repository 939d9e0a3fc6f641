//! Server-rendered views and their cache.
//!
//! Every rendered view is cached under its route and the validated wallet it was rendered for,
//! tagged with the [`RevalidationRegistry`](wallet_sync::RevalidationRegistry) generation of the
//! route. A cached view is served only while that generation is unchanged. The cache holds at
//! most [`ViewCache::capacity`] views and evicts the least recently rendered one when full.

use alloy_chains::NamedChain;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use wallet_sync::{WalletSnapshot, short_hex};

/// Default maximum number of cached views.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ViewKey {
    route: String,
    wallet: Option<WalletSnapshot>,
}

#[derive(Debug)]
struct CachedView {
    generation: u64,
    /// Insertion order, used for eviction.
    seq: u64,
    body: String,
}

#[derive(Debug, Default)]
struct Entries {
    views: HashMap<ViewKey, CachedView>,
    next_seq: u64,
}

#[derive(Debug)]
pub struct ViewCache {
    entries: Mutex<Entries>,
    capacity: usize,
    renders: AtomicUsize,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ViewCache {
    /// Creates a cache holding at most `capacity` views. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::default(),
            capacity: capacity.max(1),
            renders: AtomicUsize::new(0),
        }
    }

    /// Returns the cached view of `route` for `wallet` if it was rendered at `generation`,
    /// otherwise renders and caches it.
    pub fn get_or_render(
        &self,
        route: &str,
        wallet: Option<&WalletSnapshot>,
        generation: u64,
        render: impl FnOnce() -> String,
    ) -> String {
        let key = ViewKey { route: route.to_string(), wallet: wallet.copied() };
        let mut entries = self.entries.lock();
        if let Some(view) = entries.views.get(&key).filter(|view| view.generation == generation) {
            trace!(route, generation, "serving cached view");
            return view.body.clone();
        }

        // Views of this route from older generations can never be served again.
        entries.views.retain(|key, view| key.route != route || view.generation == generation);
        if entries.views.len() >= self.capacity {
            let oldest =
                entries.views.iter().min_by_key(|(_, view)| view.seq).map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                trace!(route = %oldest.route, "evicting view");
                entries.views.remove(&oldest);
            }
        }

        let body = render();
        self.renders.fetch_add(1, Ordering::Relaxed);
        trace!(route, generation, "rendered view");
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.views.insert(key, CachedView { generation, seq, body: body.clone() });
        body
    }

    /// Number of renders performed so far.
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    /// Maximum number of cached views.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached views.
    pub fn len(&self) -> usize {
        self.entries.lock().views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn page(title: &str, wallet: Option<&WalletSnapshot>, content: &str) -> String {
    let header = match wallet {
        Some(wallet) => format!(
            "<div>Network #{}</div><div>{}</div>",
            wallet.chain_id(),
            short_hex(&wallet.checksummed_address())
        ),
        None => "<button id=\"connect\">Connect</button>".to_string(),
    };
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><header>{header}</header><main><h3>{title}</h3>{content}</main></body></html>\n"
    )
}

/// The home page, public with or without a wallet.
pub fn render_home(wallet: Option<&WalletSnapshot>) -> String {
    let content = match wallet {
        Some(wallet) => format!(
            "<p><strong>You are connected.</strong></p>\
             <p>Wallet address is {}, network is #{}.</p>",
            short_hex(&wallet.checksummed_address()),
            wallet.chain_id()
        ),
        None => "<p><strong>You are not connected.</strong></p>\
                 <p>Connect a wallet to browse protected routes.</p>"
            .to_string(),
    };
    page("Home", wallet, &content)
}

/// The account page, only reachable with a wallet on a known chain.
pub fn render_account(wallet: &WalletSnapshot, chain: NamedChain) -> String {
    let content = format!(
        "<p>Account {} on chain {chain} (#{}).</p>",
        short_hex(&wallet.checksummed_address()),
        wallet.chain_id()
    );
    page(&format!("Account on chain {chain}"), Some(wallet), &content)
}
