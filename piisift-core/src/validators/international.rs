// File: piisift-core/src/validators/international.rs
//! Validators for non-Polish national identifiers and IBAN.
//!
//! Covers the US Social Security Number and passport, Canadian SIN, Australian
//! TFN and Medicare numbers, UK National Insurance and NHS numbers, and the
//! ISO 13616 International Bank Account Number.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::payment::luhn_sum;
use super::{all_identical, digits_of_len, ensure_input_len, weighted_sum};

const TFN_WEIGHTS: [u32; 9] = [1, 4, 3, 7, 5, 8, 6, 9, 10];
const NHS_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const MEDICARE_WEIGHTS: [u32; 8] = [1, 3, 7, 9, 1, 3, 7, 9];

/// Helper function to validate a US SSN based on Social Security Administration rules.
///
/// Accepts bare (`123456789`) and dashed (`123-45-6789`) forms.
///
/// # Returns
///
/// `false` for all-identical digits, a zero group or a zero serial. Area
/// numbers are not checked.
pub fn is_valid_us_ssn(ssn: &str) -> bool {
    let Some(digits) = digits_of_len(ssn, 9) else {
        return false;
    };
    if all_identical(&digits) {
        return false;
    }

    let group = u32::from(digits[3]) * 10 + u32::from(digits[4]);
    let serial = digits[5..].iter().fold(0u32, |acc, &d| acc * 10 + u32::from(d));

    !(group == 0 || serial == 0)
}

/// Validates a Canadian Social Insurance Number with the Luhn checksum.
pub fn is_valid_ca_sin(sin: &str) -> bool {
    let Some(digits) = digits_of_len(sin, 9) else {
        return false;
    };
    !all_identical(&digits) && luhn_sum(&digits) % 10 == 0
}

/// Validates an Australian Tax File Number: weighted sum divisible by 11.
pub fn is_valid_au_tfn(tfn: &str) -> bool {
    let Some(digits) = digits_of_len(tfn, 9) else {
        return false;
    };
    !all_identical(&digits) && weighted_sum(&digits, &TFN_WEIGHTS) % 11 == 0
}

// Use a `once_cell` to create a static HashSet for efficient lookups.
static INVALID_NINO_PREFIXES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["BG", "GB", "NK", "KN", "TN", "NT", "ZZ"].into_iter().collect());

static INVALID_NINO_PREFIX_CHARS: Lazy<HashSet<char>> =
    Lazy::new(|| ['D', 'F', 'I', 'U', 'V'].into_iter().collect());

/// Helper function to validate a UK National Insurance Number (NINO).
///
/// # Arguments
///
/// * `nino` - Expected format "AA######A". Spaces and dashes are ignored.
///
/// # Returns
///
/// `true` if the structure holds, the prefix is not administratively blocked,
/// neither prefix letter is forbidden and the suffix is A to D.
pub fn is_valid_uk_nino(nino: &str) -> bool {
    if ensure_input_len(nino).is_err() {
        return false;
    }
    let cleaned: Vec<char> = nino
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let [p1, p2, body @ .., suffix] = cleaned.as_slice() else {
        return false;
    };
    if body.len() != 6 || !body.iter().all(char::is_ascii_digit) {
        return false;
    }
    if !p1.is_ascii_uppercase() || !p2.is_ascii_uppercase() {
        return false;
    }
    if !matches!(suffix, 'A'..='D') {
        return false;
    }

    let prefix: String = [*p1, *p2].iter().collect();
    if INVALID_NINO_PREFIXES.contains(prefix.as_str()) {
        return false;
    }
    !(INVALID_NINO_PREFIX_CHARS.contains(p1) || INVALID_NINO_PREFIX_CHARS.contains(p2))
}

/// Validates a UK NHS number: ten digits with a mod-11 check digit.
///
/// A computed check of 11 maps to 0; a computed check of 10 is never issued.
pub fn is_valid_uk_nhs(nhs: &str) -> bool {
    let Some(digits) = digits_of_len(nhs, 10) else {
        return false;
    };
    let check = match 11 - weighted_sum(&digits[..9], &NHS_WEIGHTS) % 11 {
        11 => 0,
        10 => return false,
        c => c,
    };
    check == u32::from(digits[9])
}

/// Validates an Australian Medicare card number.
///
/// Ten digits, or eleven including the individual reference number. The first
/// digit is 2 to 6, the ninth digit is the weighted checksum of the first eight
/// and the tenth (issue number) must not be zero.
pub fn is_valid_au_medicare(medicare: &str) -> bool {
    let digits = match digits_of_len(medicare, 10).or_else(|| digits_of_len(medicare, 11)) {
        Some(d) => d,
        None => return false,
    };
    if !(2..=6).contains(&digits[0]) || digits[9] == 0 {
        return false;
    }
    weighted_sum(&digits[..8], &MEDICARE_WEIGHTS) % 10 == u32::from(digits[8])
}

/// Validates a US passport number.
///
/// Accepts nine digits, one letter followed by eight digits (next generation
/// books) or the legacy one letter followed by seven digits. All-zero digit
/// runs are rejected.
pub fn is_valid_us_passport(passport: &str) -> bool {
    if ensure_input_len(passport).is_err() {
        return false;
    }
    let cleaned: String = passport
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let digits = match cleaned.chars().next() {
        Some(c) if c.is_ascii_uppercase() => &cleaned[1..],
        Some(_) => cleaned.as_str(),
        None => return false,
    };
    let letter_prefixed = digits.len() != cleaned.len();
    let len_ok = if letter_prefixed {
        digits.len() == 7 || digits.len() == 8
    } else {
        digits.len() == 9
    };

    len_ok && digits.bytes().all(|b| b.is_ascii_digit()) && digits.bytes().any(|b| b != b'0')
}

/// Validates an IBAN with the ISO 13616 mod-97 check.
///
/// The first four characters are moved to the end, letters are mapped to
/// 10..=35 and the resulting number is reduced mod 97 in nine-digit chunks.
/// The IBAN is valid when the remainder is 1.
pub fn is_valid_iban(iban: &str) -> bool {
    if ensure_input_len(iban).is_err() {
        return false;
    }
    let cleaned: Vec<u8> = iban
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect();

    if !(15..=34).contains(&cleaned.len()) {
        return false;
    }
    let structure_ok = cleaned[..2].iter().all(u8::is_ascii_uppercase)
        && cleaned[2..4].iter().all(u8::is_ascii_digit)
        && cleaned[4..].iter().all(u8::is_ascii_alphanumeric);
    if !structure_ok {
        return false;
    }

    let mut converted = String::with_capacity(cleaned.len() * 2);
    for &b in cleaned[4..].iter().chain(&cleaned[..4]) {
        if b.is_ascii_digit() {
            converted.push(char::from(b));
        } else {
            converted.push_str(&u32::from(b - b'A' + 10).to_string());
        }
    }

    let mut remainder: u64 = 0;
    for chunk in converted.as_bytes().chunks(9) {
        for &b in chunk {
            remainder = remainder * 10 + u64::from(b - b'0');
        }
        remainder %= 97;
    }
    remainder == 1
}
