//! Fixture address generation for card issuance and tests.

use rand::Rng;

use crate::validation::{AddressValidator, BASE58_ALPHABET, ETH_HEX_LEN, ETH_PREFIX};

/// Characters generated after the leading `1`.
pub const GENERATED_BODY_LEN: usize = 28;

/// Generate a legacy-shaped address: `1` followed by 28 Base58 characters.
///
/// Draws are repeated until the default validator accepts the result, so a
/// generated address never trips the placeholder filter.
pub fn generate_legacy_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let validator = AddressValidator::default();
    loop {
        let candidate = draw_legacy(rng);
        if validator.is_valid(&candidate) {
            return candidate;
        }
        log::trace!("discarded generated address {candidate:?}");
    }
}

/// Generate `count` addresses with [`generate_legacy_address`].
pub fn generate_batch<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count).map(|_| generate_legacy_address(rng)).collect()
}

/// Generate an Ethereum-shaped address: `0x` followed by 40 lowercase hex digits.
pub fn generate_eth_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(ETH_PREFIX.len() + ETH_HEX_LEN);
    out.push_str(ETH_PREFIX);
    for _ in 0..ETH_HEX_LEN {
        out.push(char::from(HEX[rng.gen_range(0..HEX.len())]));
    }
    out
}

fn draw_legacy<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut out = String::with_capacity(GENERATED_BODY_LEN + 1);
    out.push('1');
    for _ in 0..GENERATED_BODY_LEN {
        let idx = rng.gen_range(0..BASE58_ALPHABET.len());
        out.push(char::from(BASE58_ALPHABET[idx]));
    }
    out
}
