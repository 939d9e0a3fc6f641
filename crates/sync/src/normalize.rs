//! Validation and canonicalization of untrusted wallet reports.

use crate::snapshot::{RawChainId, RawWalletReport, WalletSnapshot};
use alloy_primitives::{Address, ChainId, hex::FromHex};
use std::fmt;

/// Length of a `0x` prefixed, 20-byte hex address.
pub const ADDRESS_LENGTH: usize = 42;

/// Why a reported address was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("expected {ADDRESS_LENGTH} characters, got {0}")]
    InvalidLength(usize),
    #[error("missing `0x` prefix")]
    MissingPrefix,
    #[error("not a hex encoded 20-byte value")]
    InvalidHex,
    #[error("mixed-case address does not match its checksum {expected}")]
    ChecksumMismatch { expected: String },
}

/// Why a reported chain id was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainIdError {
    #[error("chain id is empty")]
    Empty,
    #[error("chain id {0:?} is not a number")]
    NotNumeric(String),
    #[error("chain id {0} is not positive")]
    NotPositive(i128),
    #[error("chain id does not fit in 64 bits")]
    OutOfRange,
}

/// A rejected [`RawWalletReport`], with the reason for every field that failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    pub address: Option<AddressError>,
    pub chain_id: Option<ChainIdError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid wallet report")?;
        let mut sep = ": ";
        if let Some(err) = &self.address {
            write!(f, "{sep}address: {err}")?;
            sep = "; ";
        }
        if let Some(err) = &self.chain_id {
            write!(f, "{sep}chainId: {err}")?;
        }
        Ok(())
    }
}

/// Validates a raw report and builds the canonical snapshot from it.
///
/// Both fields are always checked so the error names every offending field.
pub fn normalize(raw: &RawWalletReport) -> Result<WalletSnapshot, ValidationError> {
    let address = normalize_address(&raw.address);
    let chain_id = parse_chain_id(&raw.chain_id).and_then(assemble_chain_id);

    match (address, chain_id) {
        (Ok(address), Ok(chain_id)) => {
            // `assemble_chain_id` already rejected zero.
            WalletSnapshot::new(address, chain_id).ok_or(ValidationError {
                address: None,
                chain_id: Some(ChainIdError::NotPositive(0)),
            })
        }
        (address, chain_id) => {
            Err(ValidationError { address: address.err(), chain_id: chain_id.err() })
        }
    }
}

/// Parses an address and enforces checksum casing on mixed-case input.
///
/// Uniformly cased input (every letter lowercase, or every letter uppercase, prefix included)
/// carries no checksum and is accepted as is. Anything else must match the EIP-55 casing
/// exactly, so an address with corrupted casing is refused instead of silently repaired.
pub fn normalize_address(input: &str) -> Result<Address, AddressError> {
    if input.len() != ADDRESS_LENGTH {
        return Err(AddressError::InvalidLength(input.len()));
    }
    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    let address = Address::from_hex(body).map_err(|_| AddressError::InvalidHex)?;

    let has_lower = input.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = input.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let expected = address.to_checksum(None);
        if expected != input {
            return Err(AddressError::ChecksumMismatch { expected });
        }
    }
    Ok(address)
}

/// Parses the textual or numeric chain id, without judging its sign.
///
/// Accepts base-10 integers with an optional sign and `0x` prefixed hex quantities, the form
/// `eth_chainId` returns. Surrounding whitespace, fractions and exponents are rejected.
pub fn parse_chain_id(raw: &RawChainId) -> Result<i128, ChainIdError> {
    let text = match raw {
        RawChainId::Number(n) => return Ok(*n),
        RawChainId::Text(text) => text.as_str(),
    };
    if text.is_empty() {
        return Err(ChainIdError::Empty);
    }
    let not_numeric = || ChainIdError::NotNumeric(text.to_string());

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(not_numeric());
        }
        let value = u128::from_str_radix(hex, 16).map_err(|_| ChainIdError::OutOfRange)?;
        return i128::try_from(value).map_err(|_| ChainIdError::OutOfRange);
    }

    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }
    text.parse::<i128>().map_err(|_| ChainIdError::OutOfRange)
}

/// Snapshot assembly stage: a chain id must be strictly positive and fit in a [`ChainId`].
pub fn assemble_chain_id(value: i128) -> Result<ChainId, ChainIdError> {
    if value <= 0 {
        return Err(ChainIdError::NotPositive(value));
    }
    ChainId::try_from(value).map_err(|_| ChainIdError::OutOfRange)
}

/// Shortens a hex string for display, e.g. `0xAb58...eC9B`.
pub fn short_hex(value: &str) -> String {
    if value.len() <= 10 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}
