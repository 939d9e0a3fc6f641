//! Wallet identity types: the untrusted report coming from the browser and the canonical
//! snapshot derived from it.

use alloy_primitives::{Address, ChainId};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::SerializeStruct,
};
use std::fmt;

/// The canonical, validated identity of the connected wallet.
///
/// A snapshot can only be built through [`normalize`](crate::normalize::normalize) or
/// [`WalletSnapshot::new`], so holding one means both fields are well-formed: the address is a
/// 20-byte value and the chain id is strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WalletSnapshot {
    address: Address,
    chain_id: ChainId,
}

impl WalletSnapshot {
    /// Assembles a snapshot, rejecting a zero chain id.
    pub fn new(address: Address, chain_id: ChainId) -> Option<Self> {
        (chain_id > 0).then_some(Self { address, chain_id })
    }

    /// The wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The address in EIP-55 checksum casing, `0x` prefixed.
    pub fn checksummed_address(&self) -> String {
        self.address.to_checksum(None)
    }

    /// The chain id the wallet is connected to.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

impl fmt::Display for WalletSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on chain {}", self.checksummed_address(), self.chain_id)
    }
}

// Serialized as `{"address":"0x<checksummed>","chainId":<n>}`, the persisted wire shape.
impl Serialize for WalletSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("WalletSnapshot", 2)?;
        s.serialize_field("address", &self.checksummed_address())?;
        s.serialize_field("chainId", &self.chain_id)?;
        s.end()
    }
}

/// An unvalidated `(address, chainId)` pair as reported by a wallet provider or posted by a
/// client.
///
/// Nothing about a report is trusted; it only becomes useful once it went through
/// [`normalize`](crate::normalize::normalize).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWalletReport {
    pub address: String,
    #[serde(rename = "chainId")]
    pub chain_id: RawChainId,
}

impl RawWalletReport {
    pub fn new(address: impl Into<String>, chain_id: impl Into<RawChainId>) -> Self {
        Self { address: address.into(), chain_id: chain_id.into() }
    }
}

/// A chain id in whatever form the reporter chose to send it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawChainId {
    /// Textual form, e.g. `"1"` or the `"0x1"` quantity returned by `eth_chainId`.
    Text(String),
    /// Numeric form. Signed so that non-positive values survive until snapshot assembly.
    Number(i128),
}

impl From<String> for RawChainId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RawChainId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for RawChainId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for RawChainId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl Serialize for RawChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(n) => serializer.serialize_i128(*n),
        }
    }
}

impl<'de> Deserialize<'de> for RawChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawChainIdVisitor;

        impl Visitor<'_> for RawChainIdVisitor {
            type Value = RawChainId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a chain id as an integer or a string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RawChainId::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(RawChainId::Text(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RawChainId::Number(v.into()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(RawChainId::Number(v.into()))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(RawChainId::Number(v))
            }
        }

        deserializer.deserialize_any(RawChainIdVisitor)
    }
}
