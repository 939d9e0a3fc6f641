//! The injected wallet provider capability and the policy for picking one.
//!
//! Providers follow [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193): a request/response
//! channel plus `accountsChanged` / `chainChanged` event subscriptions. The environment they are
//! discovered in is abstracted behind [`EnvironmentProbe`].

use crate::snapshot::RawChainId;
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tokio::sync::mpsc;

/// Self-identification flags exposed by an injected provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    /// The provider claims to be MetaMask.
    pub is_metamask: bool,
    /// Brave Wallet also sets `is_metamask`; this flag tells it apart.
    pub is_brave_wallet: bool,
}

impl ProviderFlags {
    pub const METAMASK: Self = Self { is_metamask: true, is_brave_wallet: false };
    pub const BRAVE_WALLET: Self = Self { is_metamask: true, is_brave_wallet: true };
}

/// Provider events that require reconciling the wallet state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEvent {
    pub const ALL: [Self; 2] = [Self::AccountsChanged, Self::ChainChanged];

    /// The EIP-1193 event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
        }
    }
}

impl fmt::Display for ProviderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies a registered listener so it can be removed again.
pub type ListenerId = u64;

/// Channel a provider notifies when a subscribed event fires.
pub type EventListener = mpsc::UnboundedSender<ProviderEvent>;

/// A failed provider request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("`{method}` request failed: {message}")]
    Request { method: &'static str, message: String },
    #[error("unexpected response to `{method}`")]
    UnexpectedResponse { method: &'static str },
}

impl ProviderError {
    pub fn request(method: &'static str, message: impl fmt::Display) -> Self {
        Self::Request { method, message: message.to_string() }
    }
}

/// An injected wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn flags(&self) -> ProviderFlags;

    /// `eth_accounts`: accounts already exposed to this origin, without prompting.
    async fn accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// `eth_chainId`: the chain the wallet currently points at.
    async fn chain_id(&self) -> Result<Option<RawChainId>, ProviderError>;

    /// `eth_requestAccounts`: prompts the user to connect.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Registers `listener` for `event`.
    fn on(&self, event: ProviderEvent, listener: EventListener) -> ListenerId;

    /// Removes a listener previously returned by [`on`](Self::on).
    fn off(&self, event: ProviderEvent, id: ListenerId);
}

impl fmt::Debug for dyn WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletProvider").field("flags", &self.flags()).finish()
    }
}

/// What the environment exposes where a wallet would be injected.
#[derive(Clone)]
pub enum Injected {
    /// A single provider object.
    Single(Arc<dyn WalletProvider>),
    /// Several candidates, as exposed when more than one wallet extension is installed.
    Multiple(Vec<Arc<dyn WalletProvider>>),
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(p) => f.debug_tuple("Single").field(&p.flags()).finish(),
            Self::Multiple(ps) => {
                let flags = ps.iter().map(|p| p.flags()).collect::<Vec<_>>();
                f.debug_tuple("Multiple").field(&flags).finish()
            }
        }
    }
}

/// Looks up the injected wallet capability of the current platform.
pub trait EnvironmentProbe {
    fn injected(&self) -> Option<Injected>;
}

/// A probe over a fixed injection, for hosts that already hold their provider objects.
#[derive(Clone, Debug, Default)]
pub struct StaticProbe(pub Option<Injected>);

impl EnvironmentProbe for StaticProbe {
    fn injected(&self) -> Option<Injected> {
        self.0.clone()
    }
}

/// Picks the provider to reconcile against.
///
/// Among several candidates, a MetaMask provider that is not Brave Wallet wins, then Brave
/// Wallet's MetaMask-compatible provider, else nothing. A lone provider is used only if it
/// identifies as MetaMask.
pub fn select_provider(injected: Option<Injected>) -> Option<Arc<dyn WalletProvider>> {
    match injected? {
        Injected::Multiple(candidates) => {
            let genuine =
                candidates.iter().find(|p| p.flags().is_metamask && !p.flags().is_brave_wallet);
            genuine
                .or_else(|| candidates.iter().find(|p| p.flags().is_metamask))
                .cloned()
        }
        Injected::Single(provider) => provider.flags().is_metamask.then_some(provider),
    }
}
