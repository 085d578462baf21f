//! Replacement of missing or invalid card addresses.

use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::audit::AddressIssue;
use crate::generate::{generate_eth_address, generate_legacy_address};
use crate::types::{CardRecord, Currency};
use crate::validation::AddressValidator;

/// Draws per slot before a replacement is reported as unrepaired.
pub const MAX_REPAIR_ATTEMPTS: usize = 8;

/// One address slot that was overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    pub card_id: u64,
    pub user_id: u64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub cards_checked: usize,
    pub repaired: Vec<Repair>,
    pub unrepaired: Vec<AddressIssue>,
}

impl RepairReport {
    pub fn all_repaired(&self) -> bool {
        self.unrepaired.is_empty()
    }
}

/// Replace every missing or invalid BTC/ETH address in `cards`.
///
/// Each replacement is checked with `validator` before it is written back.
/// A slot whose replacements keep failing is left untouched and reported in
/// [`RepairReport::unrepaired`].
pub fn repair_cards<R: Rng + ?Sized>(
    validator: &AddressValidator,
    cards: &mut [CardRecord],
    rng: &mut R,
) -> RepairReport {
    let mut report = RepairReport {
        cards_checked: cards.len(),
        ..RepairReport::default()
    };

    for card in cards.iter_mut() {
        for currency in [Currency::Btc, Currency::Eth] {
            let previous = card.address(currency).map(ToOwned::to_owned);
            if let Some(addr) = previous.as_deref() {
                if validator.is_valid_for(addr, currency) {
                    continue;
                }
            }

            match draw_replacement(validator, currency, rng) {
                Some(replacement) => {
                    *slot_mut(card, currency) = Some(replacement.clone());
                    report.repaired.push(Repair {
                        card_id: card.card_id,
                        user_id: card.user_id,
                        currency,
                        previous,
                        replacement,
                    });
                }
                None => {
                    warn!(
                        "card {}: no valid {currency} replacement after {MAX_REPAIR_ATTEMPTS} attempts",
                        card.card_id
                    );
                    report.unrepaired.push(AddressIssue {
                        card_id: card.card_id,
                        user_id: card.user_id,
                        currency,
                        address: previous,
                        message: format!(
                            "no valid {currency} replacement after {MAX_REPAIR_ATTEMPTS} attempts"
                        ),
                    });
                }
            }
        }
    }

    info!(
        "repaired {} address(es) across {} cards, {} unrepaired",
        report.repaired.len(),
        report.cards_checked,
        report.unrepaired.len(),
    );

    report
}

fn draw_replacement<R: Rng + ?Sized>(
    validator: &AddressValidator,
    currency: Currency,
    rng: &mut R,
) -> Option<String> {
    (0..MAX_REPAIR_ATTEMPTS)
        .map(|_| match currency {
            Currency::Btc => generate_legacy_address(rng),
            Currency::Eth => generate_eth_address(rng),
        })
        .find(|candidate| validator.is_valid_for(candidate, currency))
}

fn slot_mut(card: &mut CardRecord, currency: Currency) -> &mut Option<String> {
    match currency {
        Currency::Btc => &mut card.btc_address,
        Currency::Eth => &mut card.eth_address,
    }
}
