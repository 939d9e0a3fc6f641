//! Scripted fakes for exercising reconciliation without a browser.

use crate::{
    invalidate::{InvalidationScope, Invalidator},
    provider::{
        EnvironmentProbe, EventListener, Injected, ListenerId, ProviderError, ProviderEvent,
        ProviderFlags, WalletProvider,
    },
    snapshot::RawChainId,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};
use tokio::sync::Semaphore;

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug, Default)]
struct Wallet {
    accounts: Vec<String>,
    chain_id: Option<RawChainId>,
    failure: Option<String>,
}

/// A provider whose answers are set by the test.
#[derive(Debug, Default)]
pub struct FakeProvider {
    flags: ProviderFlags,
    wallet: Mutex<Wallet>,
    listeners: Mutex<HashMap<ListenerId, (ProviderEvent, EventListener)>>,
    next_listener: AtomicU64,
    gate: Mutex<Option<Arc<Semaphore>>>,
    queries: AtomicUsize,
    panics: AtomicBool,
}

impl FakeProvider {
    /// A MetaMask provider with no connected account.
    pub fn new() -> Arc<Self> {
        Self::with_flags(ProviderFlags::METAMASK)
    }

    pub fn with_flags(flags: ProviderFlags) -> Arc<Self> {
        Arc::new(Self { flags, ..Default::default() })
    }

    /// Connects `account` on `chain_id` without notifying listeners.
    pub fn set_wallet(&self, account: &str, chain_id: impl Into<RawChainId>) {
        let mut wallet = self.wallet.lock();
        wallet.accounts = vec![account.to_string()];
        wallet.chain_id = Some(chain_id.into());
    }

    pub fn set_accounts(&self, accounts: Vec<String>) {
        self.wallet.lock().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: Option<RawChainId>) {
        self.wallet.lock().chain_id = chain_id;
    }

    /// Makes every following request fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.wallet.lock().failure = message.map(str::to_string);
    }

    /// Holds every following `eth_accounts` request until [`resume`](Self::resume).
    pub fn pause(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Makes every following `eth_accounts` request panic, as a buggy wallet might.
    pub fn set_panicking(&self, panics: bool) {
        self.panics.store(panics, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.add_permits(1024);
        }
    }

    /// Fires `event` to every listener registered for it.
    pub fn emit(&self, event: ProviderEvent) {
        for (kind, listener) in self.listeners.lock().values() {
            if *kind == event {
                let _ = listener.send(event);
            }
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Number of `eth_accounts` requests served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_failure(&self, method: &'static str) -> Result<(), ProviderError> {
        match &self.wallet.lock().failure {
            Some(message) => Err(ProviderError::request(method, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    fn flags(&self) -> ProviderFlags {
        self.flags
    }

    async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        assert!(!self.panics.load(Ordering::SeqCst), "eth_accounts panicked");
        self.check_failure("eth_accounts")?;
        Ok(self.wallet.lock().accounts.clone())
    }

    async fn chain_id(&self) -> Result<Option<RawChainId>, ProviderError> {
        self.check_failure("eth_chainId")?;
        Ok(self.wallet.lock().chain_id.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.check_failure("eth_requestAccounts")?;
        let accounts = self.wallet.lock().accounts.clone();
        if !accounts.is_empty() {
            self.emit(ProviderEvent::AccountsChanged);
        }
        Ok(accounts)
    }

    fn on(&self, event: ProviderEvent, listener: EventListener) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().insert(id, (event, listener));
        id
    }

    fn off(&self, event: ProviderEvent, id: ListenerId) {
        let mut listeners = self.listeners.lock();
        if listeners.get(&id).is_some_and(|(kind, _)| *kind == event) {
            listeners.remove(&id);
        }
    }
}

/// A probe that reports a scripted injection.
#[derive(Clone, Debug, Default)]
pub struct FakeProbe {
    injected: Option<Injected>,
}

impl FakeProbe {
    /// A browser without any injected wallet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(provider: Arc<FakeProvider>) -> Self {
        Self { injected: Some(Injected::Single(provider)) }
    }

    pub fn multiple(providers: Vec<Arc<FakeProvider>>) -> Self {
        let providers = providers.into_iter().map(|p| p as Arc<dyn WalletProvider>).collect();
        Self { injected: Some(Injected::Multiple(providers)) }
    }
}

impl EnvironmentProbe for FakeProbe {
    fn injected(&self) -> Option<Injected> {
        self.injected.clone()
    }
}

/// Records every invalidation it receives.
#[derive(Debug, Default)]
pub struct CountingInvalidator {
    scopes: Mutex<Vec<InvalidationScope>>,
}

impl CountingInvalidator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.scopes.lock().len()
    }

    pub fn scopes(&self) -> Vec<InvalidationScope> {
        self.scopes.lock().clone()
    }
}

impl Invalidator for CountingInvalidator {
    fn invalidate(&self, scope: &InvalidationScope) {
        self.scopes.lock().push(scope.clone());
    }
}
