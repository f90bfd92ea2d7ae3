// File: piisift-core/src/validators/polish.rs
//! Polish national and business identifiers: NIP, REGON and PESEL.
//!
//! Each identifier carries a weighted mod-N check digit. Alongside the validators
//! this module offers generators that append the check digit to a payload, and a
//! PESEL decoder that recovers the birth date and sex encoded in the number.
//!
//! License: MIT OR APACHE 2.0

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{digits_of_len, extract_digits, weighted_sum};
use crate::errors::PiiSiftError;

const NIP_WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];
const REGON9_WEIGHTS: [u32; 8] = [8, 9, 2, 3, 4, 5, 6, 7];
const REGON14_WEIGHTS: [u32; 13] = [2, 4, 8, 5, 0, 9, 7, 3, 6, 1, 2, 4, 8];
const PESEL_WEIGHTS: [u32; 10] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3];

/// Mod-11 check digit shared by NIP and REGON. A result of 10 is not issued.
fn mod11_check(payload: &[u8], weights: &[u32]) -> Option<u8> {
    let check = weighted_sum(payload, weights) % 11;
    if check == 10 {
        None
    } else {
        Some(check as u8)
    }
}

fn pesel_check(payload: &[u8]) -> u8 {
    ((10 - weighted_sum(payload, &PESEL_WEIGHTS) % 10) % 10) as u8
}

fn verify_mod11(text: &str, len: usize, weights: &[u32]) -> bool {
    let Some(digits) = digits_of_len(text, len) else {
        return false;
    };
    let (payload, check) = digits.split_at(len - 1);
    mod11_check(payload, weights) == Some(check[0])
}

/// Validates a Polish tax identification number (NIP).
///
/// # Arguments
///
/// * `nip` - Ten digits, separators such as `-` or spaces are ignored.
///
/// # Returns
///
/// `true` if the weighted checksum matches the final digit.
pub fn is_valid_nip(nip: &str) -> bool {
    verify_mod11(nip, 10, &NIP_WEIGHTS)
}

/// Validates a nine-digit REGON.
pub fn is_valid_regon9(regon: &str) -> bool {
    verify_mod11(regon, 9, &REGON9_WEIGHTS)
}

/// Validates a fourteen-digit REGON (local unit number).
pub fn is_valid_regon14(regon: &str) -> bool {
    verify_mod11(regon, 14, &REGON14_WEIGHTS)
}

/// Validates either REGON form, dispatching on digit count.
pub fn is_valid_regon(regon: &str) -> bool {
    match extract_digits(regon).map(|d| d.len()) {
        Ok(9) => is_valid_regon9(regon),
        Ok(14) => is_valid_regon14(regon),
        _ => false,
    }
}

/// Validates a PESEL (Polish personal identification number).
pub fn is_valid_pesel(pesel: &str) -> bool {
    let Some(digits) = digits_of_len(pesel, 11) else {
        return false;
    };
    pesel_check(&digits[..10]) == digits[10]
}

/// Sex encoded in the parity of the tenth PESEL digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

/// Birth date and sex recovered from a PESEL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeselBirth {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub sex: Sex,
}

/// Decodes the birth date and sex from the first ten PESEL digits.
///
/// The month field encodes the century: 01-12 for the 1900s, 21-32 for the
/// 2000s, 41-52 for the 2100s, 61-72 for the 2200s and 81-92 for the 1800s.
/// Returns `None` for an unknown band or a day that does not exist in that month.
/// The check digit is not verified here; pair with [`is_valid_pesel`].
pub fn decode_pesel(pesel: &str) -> Option<PeselBirth> {
    let digits = digits_of_len(pesel, 11)?;
    let yy = i32::from(digits[0] * 10 + digits[1]);
    let mm = u32::from(digits[2] * 10 + digits[3]);
    let dd = u32::from(digits[4] * 10 + digits[5]);

    let (century, month) = match mm {
        1..=12 => (1900, mm),
        21..=32 => (2000, mm - 20),
        41..=52 => (2100, mm - 40),
        61..=72 => (2200, mm - 60),
        81..=92 => (1800, mm - 80),
        _ => return None,
    };
    let year = century + yy;
    NaiveDate::from_ymd_opt(year, month, dd)?;

    let sex = if digits[9] % 2 == 1 { Sex::Male } else { Sex::Female };
    Some(PeselBirth {
        year,
        month,
        day: dd,
        sex,
    })
}

fn payload_digits(payload: &str, len: usize, kind: &str) -> Result<Vec<u8>, PiiSiftError> {
    let digits = extract_digits(payload)?;
    if digits.len() != len {
        return Err(PiiSiftError::MalformedInput(format!(
            "{} payload needs {} digits, got {}",
            kind,
            len,
            digits.len()
        )));
    }
    Ok(digits)
}

fn append_mod11(payload: &str, len: usize, weights: &[u32], kind: &str) -> Result<String, PiiSiftError> {
    let digits = payload_digits(payload, len, kind)?;
    let check = mod11_check(&digits, weights).ok_or_else(|| {
        PiiSiftError::MalformedInput(format!("{} payload yields check digit 10", kind))
    })?;
    Ok(render(&digits, check))
}

fn render(payload: &[u8], check: u8) -> String {
    payload
        .iter()
        .chain(std::iter::once(&check))
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// Appends the NIP check digit to a nine-digit payload.
pub fn generate_nip(payload: &str) -> Result<String, PiiSiftError> {
    append_mod11(payload, 9, &NIP_WEIGHTS, "NIP")
}

/// Appends the REGON check digit to an eight-digit payload.
pub fn generate_regon9(payload: &str) -> Result<String, PiiSiftError> {
    append_mod11(payload, 8, &REGON9_WEIGHTS, "REGON-9")
}

/// Appends the REGON check digit to a thirteen-digit payload.
pub fn generate_regon14(payload: &str) -> Result<String, PiiSiftError> {
    append_mod11(payload, 13, &REGON14_WEIGHTS, "REGON-14")
}

/// Appends the PESEL check digit to a ten-digit payload.
pub fn generate_pesel(payload: &str) -> Result<String, PiiSiftError> {
    let digits = payload_digits(payload, 10, "PESEL")?;
    let check = pesel_check(&digits);
    Ok(render(&digits, check))
}
