//! Core library for cardaddr: address validation, card audits and repairs, and shared types.

pub mod audit;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod placeholder;
pub mod records;
pub mod repair;
pub mod types;
pub mod validation;

pub use audit::{audit_cards, AddressIssue, AuditReport, Tally};
pub use config::ValidatorConfig;
pub use error::{CardAddrError, Result};
pub use generate::{generate_batch, generate_eth_address, generate_legacy_address};
pub use output::{truncate_address, AgentError, OutputMode};
pub use placeholder::PlaceholderReason;
pub use repair::{repair_cards, Repair, RepairReport};
pub use types::{AddressFamily, CardRecord, Currency, LegacyRule};
pub use validation::{
    is_valid_address, is_valid_optional_address, validate_address, validate_crypto_address,
    AddressValidationError, AddressValidator,
};
