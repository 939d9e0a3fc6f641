//! The reconciliation state machine.
//!
//! A [`ReconciliationController`] selects the injected provider once, then performs one check
//! right away and one per `accountsChanged` / `chainChanged` event. Each check reads the account
//! list and chain id, normalizes them, saves or clears the session snapshot and, when the
//! resulting [`WalletStatus`] differs from the previous one, invalidates the dependent scope.
//!
//! Events are handled one at a time in arrival order. Events that are already queued when a check
//! starts are folded into that check, so a burst of events produces a single query.

use crate::{
    invalidate::{InvalidationScope, Invalidator},
    normalize::normalize,
    provider::{
        EnvironmentProbe, ListenerId, ProviderError, ProviderEvent, WalletProvider,
        select_provider,
    },
    snapshot::{RawWalletReport, WalletSnapshot},
    store::{SessionStore, SnapshotStore},
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// Connection status while a provider is available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletStatus {
    Disconnected,
    Connected(WalletSnapshot),
}

impl WalletStatus {
    pub fn snapshot(&self) -> Option<&WalletSnapshot> {
        match self {
            Self::Connected(snapshot) => Some(snapshot),
            Self::Disconnected => None,
        }
    }
}

/// Where the controller stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// The environment has not been probed yet.
    #[default]
    Unobserved,
    /// No suitable wallet provider is injected.
    NoProvider,
    /// A provider was selected. `None` until its first check completes.
    ProviderAvailable(Option<WalletStatus>),
}

impl ControllerState {
    pub fn availability(&self) -> Availability {
        match self {
            Self::Unobserved => Availability::Unknown,
            Self::NoProvider => Availability::Unavailable,
            Self::ProviderAvailable(_) => Availability::Available,
        }
    }

    pub fn status(&self) -> Option<&WalletStatus> {
        match self {
            Self::ProviderAvailable(status) => status.as_ref(),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&WalletSnapshot> {
        self.status().and_then(WalletStatus::snapshot)
    }
}

/// Whether the browser has a usable wallet, as shown by an availability banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Unknown,
    Available,
    Unavailable,
}

/// Drives reconciliation for one client session.
pub struct ReconciliationController<S, I> {
    store: SnapshotStore,
    session: S,
    invalidator: I,
    scope: InvalidationScope,
    provider: Option<Arc<dyn WalletProvider>>,
    state: watch::Sender<ControllerState>,
}

impl<S: SessionStore, I: Invalidator> ReconciliationController<S, I> {
    /// Creates a controller writing to `session` and invalidating the whole application.
    pub fn new(session: S, invalidator: I) -> Self {
        Self {
            store: SnapshotStore::default(),
            session,
            invalidator,
            scope: InvalidationScope::app(),
            provider: None,
            state: watch::Sender::new(ControllerState::Unobserved),
        }
    }

    /// Sets the store used to persist snapshots.
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = store;
        self
    }

    /// Sets the scope invalidated on every status transition.
    pub fn with_scope(mut self, scope: InvalidationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Probes the environment and selects the provider. Only the first call has an effect.
    pub fn observe(&mut self, probe: &dyn EnvironmentProbe) -> ControllerState {
        if *self.state.borrow() == ControllerState::Unobserved {
            self.provider = select_provider(probe.injected());
            let next = match self.provider {
                Some(_) => ControllerState::ProviderAvailable(None),
                None => ControllerState::NoProvider,
            };
            debug!(state = ?next, "observed wallet environment");
            self.state.send_replace(next);
        }
        self.state()
    }

    /// Queries the selected provider and applies the result.
    ///
    /// Returns `None` without a provider.
    pub async fn check(&mut self) -> Option<WalletStatus> {
        let provider = self.provider.clone()?;
        let report = query(provider.as_ref()).await;
        Some(self.apply(report))
    }

    /// Commits the outcome of a provider query: persists or clears the snapshot and invalidates
    /// the scope if the status changed.
    pub fn apply(
        &mut self,
        report: Result<Option<RawWalletReport>, ProviderError>,
    ) -> WalletStatus {
        let status = match report {
            Ok(Some(raw)) => match normalize(&raw) {
                Ok(snapshot) => {
                    self.store.save(&mut self.session, &snapshot);
                    WalletStatus::Connected(snapshot)
                }
                Err(err) => {
                    debug!(%err, "wallet report rejected");
                    self.store.clear(&mut self.session);
                    WalletStatus::Disconnected
                }
            },
            Ok(None) => {
                self.store.clear(&mut self.session);
                WalletStatus::Disconnected
            }
            Err(err) => {
                warn!(%err, "wallet provider query failed");
                self.store.clear(&mut self.session);
                WalletStatus::Disconnected
            }
        };

        let next = ControllerState::ProviderAvailable(Some(status.clone()));
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(?status, "wallet status changed");
            self.invalidator.invalidate(&self.scope);
        }
        status
    }

    /// Runs the initial check, then reacts to provider events until `token` is cancelled.
    ///
    /// Listeners are registered on entry and removed on every exit path, including the future
    /// being dropped. A query still pending at cancellation is discarded.
    pub async fn run(mut self, token: CancellationToken) {
        let Some(provider) = self.provider.clone() else { return };

        let (tx, mut events) = mpsc::unbounded_channel();
        let _listeners = Listeners::register(provider.clone(), tx);

        if self.check_until_cancelled(provider.as_ref(), &token).await.is_none() {
            return;
        }

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            let mut folded = 0usize;
            while events.try_recv().is_ok() {
                folded += 1;
            }
            trace!(%event, folded, "provider event");

            if self.check_until_cancelled(provider.as_ref(), &token).await.is_none() {
                break;
            }
        }
        debug!("reconciliation stopped");
    }

    async fn check_until_cancelled(
        &mut self,
        provider: &dyn WalletProvider,
        token: &CancellationToken,
    ) -> Option<WalletStatus> {
        let report = tokio::select! {
            biased;
            _ = token.cancelled() => return None,
            report = query(provider) => report,
        };
        Some(self.apply(report))
    }
}

impl<S, I> ReconciliationController<S, I>
where
    S: SessionStore + Send + 'static,
    I: Invalidator + 'static,
{
    /// Probes the environment and spawns the reconciliation loop on the current runtime.
    pub fn spawn(mut self, probe: &dyn EnvironmentProbe) -> ControllerHandle {
        self.observe(probe);
        let token = CancellationToken::new();
        let state = self.subscribe();
        let provider = self.provider.clone();
        let task = provider.is_some().then(|| tokio::spawn(self.run(token.clone())));
        ControllerHandle { token, state, provider, task }
    }
}

/// Reads the account list and chain id. `Ok(None)` means no wallet is connected.
async fn query(
    provider: &dyn WalletProvider,
) -> Result<Option<RawWalletReport>, ProviderError> {
    let accounts = provider.accounts().await?;
    let chain_id = provider.chain_id().await?;
    let account = accounts.into_iter().next().filter(|account| !account.is_empty());
    Ok(account.zip(chain_id).map(|(address, chain_id)| RawWalletReport { address, chain_id }))
}

/// Provider listeners owned by a running controller, removed on drop.
struct Listeners {
    provider: Arc<dyn WalletProvider>,
    ids: Vec<(ProviderEvent, ListenerId)>,
}

impl Listeners {
    fn register(
        provider: Arc<dyn WalletProvider>,
        listener: mpsc::UnboundedSender<ProviderEvent>,
    ) -> Self {
        let ids = ProviderEvent::ALL
            .into_iter()
            .map(|event| (event, provider.on(event, listener.clone())))
            .collect();
        Self { provider, ids }
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        for (event, id) in self.ids.drain(..) {
            self.provider.off(event, id);
        }
    }
}

/// Handle to a spawned controller. Dropping it tears the controller down.
#[derive(Debug)]
pub struct ControllerHandle {
    token: CancellationToken,
    state: watch::Receiver<ControllerState>,
    provider: Option<Arc<dyn WalletProvider>>,
    task: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    pub fn availability(&self) -> Availability {
        self.state.borrow().availability()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }

    /// Asks the wallet to connect. The resulting `accountsChanged` event drives reconciliation.
    ///
    /// Does nothing when no provider is available.
    pub async fn connect(&self) -> Result<(), ProviderError> {
        if let Some(provider) = &self.provider {
            provider.request_accounts().await?;
        }
        Ok(())
    }

    /// Stops reacting to provider events and waits until listeners are removed.
    pub async fn teardown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!(%err, "reconciliation task failed");
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
