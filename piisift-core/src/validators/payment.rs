// File: piisift-core/src/validators/payment.rs
//! Payment card validation: the Luhn checksum and an IIN-based brand classifier.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

use super::extract_digits;

/// Runs the Luhn (mod 10) algorithm over the digits of `number`.
///
/// Starting from the rightmost digit, every second digit is doubled and 9 is
/// subtracted when the result exceeds 9. The number is valid when the total
/// is divisible by 10. Non-digit characters are ignored.
pub fn is_valid_luhn(number: &str) -> bool {
    let Ok(digits) = extract_digits(number) else {
        return false;
    };
    if digits.len() < 2 {
        return false;
    }
    luhn_sum(&digits) % 10 == 0
}

pub(crate) fn luhn_sum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let d = u32::from(d);
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum()
}

/// Validates a payment card number: 13 to 19 digits passing Luhn.
///
/// # Arguments
///
/// * `card_number` - The card number, with or without spaces and dashes.
///
/// # Returns
///
/// `true` if the digit count is in range and the Luhn checksum holds.
pub fn is_valid_credit_card(card_number: &str) -> bool {
    let Ok(digits) = extract_digits(card_number) else {
        return false;
    };
    (13..=19).contains(&digits.len()) && luhn_sum(&digits) % 10 == 0
}

/// Card network inferred from the issuer identification number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Diners,
    Unknown,
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardBrand::Visa => "VISA",
            CardBrand::Mastercard => "MASTERCARD",
            CardBrand::Amex => "AMEX",
            CardBrand::Discover => "DISCOVER",
            CardBrand::Jcb => "JCB",
            CardBrand::Diners => "DINERS",
            CardBrand::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Classifies a card number by its leading digits. The checksum is not checked.
pub fn card_brand(card_number: &str) -> CardBrand {
    let Ok(digits) = extract_digits(card_number) else {
        return CardBrand::Unknown;
    };
    let prefix = |n: usize| -> u32 {
        digits
            .iter()
            .take(n)
            .fold(0u32, |acc, &d| acc * 10 + u32::from(d))
    };
    if digits.len() < 4 {
        return CardBrand::Unknown;
    }

    let p1 = prefix(1);
    let p2 = prefix(2);
    let p3 = prefix(3);
    let p4 = prefix(4);

    if p1 == 4 {
        CardBrand::Visa
    } else if (51..=55).contains(&p2) || (2221..=2720).contains(&p4) {
        CardBrand::Mastercard
    } else if p2 == 34 || p2 == 37 {
        CardBrand::Amex
    } else if p4 == 6011 || p2 == 65 || (644..=649).contains(&p3) {
        CardBrand::Discover
    } else if (3528..=3589).contains(&p4) {
        CardBrand::Jcb
    } else if (300..=305).contains(&p3) || p2 == 36 || p2 == 38 {
        CardBrand::Diners
    } else {
        CardBrand::Unknown
    }
}
