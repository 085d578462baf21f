//! Audit of stored card addresses against the canonical validator.

use log::info;
use serde::Serialize;

use crate::types::{CardRecord, Currency};
use crate::validation::AddressValidator;

/// Valid/invalid counts for a single currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub valid: usize,
    pub invalid: usize,
}

/// A stored address that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressIssue {
    pub card_id: u64,
    pub user_id: u64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub cards_checked: usize,
    pub btc: Tally,
    pub eth: Tally,
    pub issues: Vec<AddressIssue>,
}

impl AuditReport {
    pub fn all_valid(&self) -> bool {
        self.btc.invalid == 0 && self.eth.invalid == 0
    }

    pub fn tally(&self, currency: Currency) -> Tally {
        match currency {
            Currency::Btc => self.btc,
            Currency::Eth => self.eth,
        }
    }

    fn tally_mut(&mut self, currency: Currency) -> &mut Tally {
        match currency {
            Currency::Btc => &mut self.btc,
            Currency::Eth => &mut self.eth,
        }
    }
}

/// Validate both addresses of every card. A missing address counts as invalid.
pub fn audit_cards(validator: &AddressValidator, cards: &[CardRecord]) -> AuditReport {
    let mut report = AuditReport {
        cards_checked: cards.len(),
        ..AuditReport::default()
    };

    for card in cards {
        for currency in [Currency::Btc, Currency::Eth] {
            let address = card.address(currency);
            let verdict = match address {
                Some(addr) => validator.validate_for(addr, currency).map_err(|e| e.to_string()),
                None => Err(format!("{currency} address is missing")),
            };

            let tally = report.tally_mut(currency);
            match verdict {
                Ok(_) => tally.valid += 1,
                Err(message) => {
                    tally.invalid += 1;
                    report.issues.push(AddressIssue {
                        card_id: card.card_id,
                        user_id: card.user_id,
                        currency,
                        address: address.map(ToOwned::to_owned),
                        message,
                    });
                }
            }
        }
    }

    info!(
        "audited {} cards: btc {}/{} valid, eth {}/{} valid",
        report.cards_checked,
        report.btc.valid,
        report.btc.valid + report.btc.invalid,
        report.eth.valid,
        report.eth.valid + report.eth.invalid,
    );

    report
}
