//! Canonical address validation shared by generation, display, and persistence paths.
//!
//! Validation is syntactic only. Base58Check and Bech32 checksums are not
//! verified, and nothing is looked up on-chain.

use std::ops::RangeInclusive;

use log::debug;
use thiserror::Error;

use crate::placeholder::{self, PlaceholderReason};
use crate::types::{AddressFamily, Currency, LegacyRule};

const STRICT_LEGACY_BODY_LEN: RangeInclusive<usize> = 25..=34;
const HISTORICAL_LEGACY_BODY_LEN: RangeInclusive<usize> = 24..=33;

pub const BECH32_PREFIX: &str = "bc1";
const BECH32_BODY_LEN: RangeInclusive<usize> = 39..=59;

pub const TAPROOT_PREFIX: &str = "bc1p";
const TAPROOT_BODY_LEN: RangeInclusive<usize> = 58..=89;

pub const ETH_PREFIX: &str = "0x";
pub const ETH_HEX_LEN: usize = 40;

/// Base58 alphabet: digits and letters without `0`, `O`, `I`, `l`.
pub const BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Rejection reasons for the typed validation path.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressValidationError {
    #[error("invalid address format: address is empty")]
    Empty,
    #[error("invalid address format: placeholder address ({0})")]
    Placeholder(PlaceholderReason),
    #[error("invalid address format: not a recognised {currency} address")]
    InvalidFormat { currency: Currency },
}

fn is_base58(b: u8) -> bool {
    matches!(b, b'1'..=b'9' | b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z' | b'a'..=b'k' | b'm'..=b'z')
}

/// `[a-km-zA-HJ-NP-Z0-9]`: Base58 plus the digit `0`.
fn is_base58_with_zero(b: u8) -> bool {
    b == b'0' || is_base58(b)
}

/// `[a-zA-HJ-NP-Z0-9]`: every lowercase letter, no uppercase `I`/`O`.
fn is_segwit_body(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z')
}

/// Strip surrounding whitespace and the U+FEFF byte-order mark, which
/// spreadsheet exports leave on the first cell.
fn trim_input(address: &str) -> &str {
    address.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn body_matches(body: &str, len: RangeInclusive<usize>, class: fn(u8) -> bool) -> bool {
    // Only ASCII bytes pass `class`, so byte length equals character count.
    len.contains(&body.len()) && body.bytes().all(class)
}

/// Validator for card addresses with a configurable legacy rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressValidator {
    legacy_rule: LegacyRule,
}

impl AddressValidator {
    pub const fn new(legacy_rule: LegacyRule) -> Self {
        Self { legacy_rule }
    }

    pub const fn legacy_rule(&self) -> LegacyRule {
        self.legacy_rule
    }

    /// Validate a Bitcoin address and report its family.
    pub fn validate(&self, address: &str) -> Result<AddressFamily, AddressValidationError> {
        self.validate_for(address, Currency::Btc)
    }

    /// Validate an address for the given currency tag.
    pub fn validate_for(
        &self,
        address: &str,
        currency: Currency,
    ) -> Result<AddressFamily, AddressValidationError> {
        let s = trim_input(address);
        if s.is_empty() {
            return Err(AddressValidationError::Empty);
        }

        let family = match currency {
            Currency::Btc => {
                if let Err(reason) = placeholder::check(s) {
                    debug!("rejected placeholder btc address {s:?}: {reason}");
                    return Err(AddressValidationError::Placeholder(reason));
                }
                self.btc_shape(s)
            }
            Currency::Eth => eth_shape(s),
        };

        match family {
            Some(family) => {
                debug!("accepted {currency} address {s:?} as {}", family.as_str());
                Ok(family)
            }
            None => {
                debug!("rejected {currency} address {s:?}: no shape matched");
                Err(AddressValidationError::InvalidFormat { currency })
            }
        }
    }

    /// Boolean form of [`validate`](Self::validate). Never panics.
    pub fn is_valid(&self, address: &str) -> bool {
        self.validate(address).is_ok()
    }

    /// Boolean form of [`validate_for`](Self::validate_for).
    pub fn is_valid_for(&self, address: &str, currency: Currency) -> bool {
        self.validate_for(address, currency).is_ok()
    }

    /// Match a trimmed, filter-cleared value against the Bitcoin shapes.
    fn btc_shape(&self, s: &str) -> Option<AddressFamily> {
        if self.is_legacy(s) {
            return Some(AddressFamily::Legacy);
        }
        if let Some(body) = s.strip_prefix(TAPROOT_PREFIX) {
            if body_matches(body, TAPROOT_BODY_LEN, is_base58_with_zero) {
                return Some(AddressFamily::Taproot);
            }
        }
        if let Some(body) = s.strip_prefix(BECH32_PREFIX) {
            if body_matches(body, BECH32_BODY_LEN, is_segwit_body) {
                return Some(AddressFamily::Bech32);
            }
        }
        None
    }

    fn is_legacy(&self, s: &str) -> bool {
        let Some(body) = s.strip_prefix(['1', '3']) else {
            return false;
        };
        match self.legacy_rule {
            LegacyRule::Strict => body_matches(body, STRICT_LEGACY_BODY_LEN, is_base58),
            LegacyRule::Historical => {
                body_matches(body, HISTORICAL_LEGACY_BODY_LEN, is_base58_with_zero)
            }
        }
    }
}

fn eth_shape(s: &str) -> Option<AddressFamily> {
    let hex = s.strip_prefix(ETH_PREFIX)?;
    if hex.len() == ETH_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(AddressFamily::Ethereum)
    } else {
        None
    }
}

/// Whether `address` is an acceptable Bitcoin address under the default rules.
pub fn is_valid_address(address: &str) -> bool {
    AddressValidator::default().is_valid(address)
}

/// Like [`is_valid_address`], treating a missing value as invalid.
pub fn is_valid_optional_address(address: Option<&str>) -> bool {
    address.is_some_and(is_valid_address)
}

/// Accept/reject decision for the card-issuance path.
pub fn validate_crypto_address(address: &str, currency: Currency) -> bool {
    AddressValidator::default().is_valid_for(address, currency)
}

/// Typed variant of [`validate_crypto_address`] under the default rules.
pub fn validate_address(
    address: &str,
    currency: Currency,
) -> Result<AddressFamily, AddressValidationError> {
    AddressValidator::default().validate_for(address, currency)
}
