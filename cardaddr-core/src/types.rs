//! Data types shared between CLI and core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CardAddrError;

/// Currency tag attached to a card address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Btc,
    Eth,
}

impl Currency {
    /// Stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Btc => "btc",
            Currency::Eth => "eth",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = CardAddrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "btc" => Ok(Currency::Btc),
            "eth" => Ok(Currency::Eth),
            other => Err(CardAddrError::parse(
                "E_CURRENCY",
                format!("unsupported currency '{other}', expected btc or eth"),
            )),
        }
    }
}

/// Address family recognised by the shape validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// Base58 P2PKH/P2SH, leading `1` or `3`.
    Legacy,
    /// Native SegWit, leading `bc1`.
    Bech32,
    /// SegWit v1, leading `bc1p`.
    Taproot,
    /// `0x` followed by 40 hex digits.
    Ethereum,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Legacy => "legacy",
            AddressFamily::Bech32 => "bech32",
            AddressFamily::Taproot => "taproot",
            AddressFamily::Ethereum => "ethereum",
        }
    }
}

/// Which legacy-address rule set is authoritative.
///
/// `Strict` uses the Base58 alphabet with 25-34 characters after the
/// version prefix. `Historical` reproduces the looser rule that admitted
/// `0` and accepted 24-33 trailing characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyRule {
    #[default]
    Strict,
    Historical,
}

/// A card row as stored by the issuing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub card_id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btc_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_address: Option<String>,
}

impl CardRecord {
    /// Stored address for `currency`, if any.
    pub fn address(&self, currency: Currency) -> Option<&str> {
        match currency {
            Currency::Btc => self.btc_address.as_deref(),
            Currency::Eth => self.eth_address.as_deref(),
        }
    }
}
