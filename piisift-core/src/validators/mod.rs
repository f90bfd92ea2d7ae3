// File: piisift-core/src/validators/mod.rs
//! Programmatic validation functions for national and financial identifiers.
//!
//! This module provides checksum and structural validation beyond regular expression
//! matching for identifiers such as PESEL, NIP, IBAN or payment card numbers. These
//! functions cut false positives by rejecting candidates that cannot be real identifiers.
//!
//! Every validator is pure and deterministic. Inputs longer than
//! [`MAX_VALIDATOR_INPUT`] bytes are rejected before any per-character loop runs.
//!
//! Validators are bound to recognizers through the closed [`ValidatorKind`]
//! enumeration, resolved once when recognizer definitions are loaded.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PiiSiftError;

pub mod format;
pub mod international;
pub mod payment;
pub mod polish;

pub use format::{is_valid_iso_date_format, is_valid_phone_format};
pub use international::{
    is_valid_au_medicare, is_valid_au_tfn, is_valid_ca_sin, is_valid_iban, is_valid_uk_nhs,
    is_valid_uk_nino, is_valid_us_passport, is_valid_us_ssn,
};
pub use payment::{card_brand, is_valid_credit_card, is_valid_luhn, CardBrand};
pub use polish::{
    decode_pesel, generate_nip, generate_pesel, generate_regon14, generate_regon9, is_valid_nip,
    is_valid_pesel, is_valid_regon, is_valid_regon14, is_valid_regon9, PeselBirth, Sex,
};

/// Maximum number of bytes a validator will look at.
pub const MAX_VALIDATOR_INPUT: usize = 256;

/// Extracts the decimal digits of `text` as numeric values.
///
/// Returns `MalformedInput` when the input exceeds [`MAX_VALIDATOR_INPUT`].
pub fn extract_digits(text: &str) -> Result<Vec<u8>, PiiSiftError> {
    ensure_input_len(text)?;
    Ok(text
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect())
}

/// Rejects inputs above the validator length cap.
pub(crate) fn ensure_input_len(text: &str) -> Result<(), PiiSiftError> {
    if text.len() > MAX_VALIDATOR_INPUT {
        return Err(PiiSiftError::MalformedInput(format!(
            "validator input of {} bytes exceeds the {} byte limit",
            text.len(),
            MAX_VALIDATOR_INPUT
        )));
    }
    Ok(())
}

/// Extracts digits and requires an exact count, returning `None` otherwise.
pub(crate) fn digits_of_len(text: &str, len: usize) -> Option<Vec<u8>> {
    extract_digits(text).ok().filter(|d| d.len() == len)
}

/// Weighted digit sum used by most mod-N checksums.
pub(crate) fn weighted_sum(digits: &[u8], weights: &[u32]) -> u32 {
    digits
        .iter()
        .zip(weights)
        .map(|(&d, &w)| u32::from(d) * w)
        .sum()
}

/// True when every digit is identical (dummy values like 111111111).
pub(crate) fn all_identical(digits: &[u8]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Closed set of validators a recognizer may be bound to.
///
/// Deserialization goes through [`FromStr`], so YAML accepts every alias
/// (`checksum_pesel`, `credit_card`, `nino`, ...) that the parser does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Nip,
    Regon,
    Pesel,
    Luhn,
    Iban,
    UsSsn,
    CaSin,
    AuTfn,
    UkNino,
    UkNhs,
    AuMedicare,
    UsPassport,
    PhoneFormat,
    DateFormat,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 14] = [
        ValidatorKind::Nip,
        ValidatorKind::Regon,
        ValidatorKind::Pesel,
        ValidatorKind::Luhn,
        ValidatorKind::Iban,
        ValidatorKind::UsSsn,
        ValidatorKind::CaSin,
        ValidatorKind::AuTfn,
        ValidatorKind::UkNino,
        ValidatorKind::UkNhs,
        ValidatorKind::AuMedicare,
        ValidatorKind::UsPassport,
        ValidatorKind::PhoneFormat,
        ValidatorKind::DateFormat,
    ];

    /// Canonical binding name, as written in recognizer YAML.
    pub fn name(&self) -> &'static str {
        match self {
            ValidatorKind::Nip => "nip",
            ValidatorKind::Regon => "regon",
            ValidatorKind::Pesel => "pesel",
            ValidatorKind::Luhn => "luhn",
            ValidatorKind::Iban => "iban",
            ValidatorKind::UsSsn => "us_ssn",
            ValidatorKind::CaSin => "ca_sin",
            ValidatorKind::AuTfn => "au_tfn",
            ValidatorKind::UkNino => "uk_nino",
            ValidatorKind::UkNhs => "uk_nhs",
            ValidatorKind::AuMedicare => "au_medicare",
            ValidatorKind::UsPassport => "us_passport",
            ValidatorKind::PhoneFormat => "phone_format",
            ValidatorKind::DateFormat => "date_format",
        }
    }

    /// Runs the bound validator. Oversized input is reported as `MalformedInput`
    /// instead of a plain `false` so callers can tell the two apart.
    pub fn try_validate(&self, text: &str) -> Result<bool, PiiSiftError> {
        ensure_input_len(text)?;
        Ok(self.validate(text))
    }

    /// Runs the bound validator, returning `false` for anything malformed.
    pub fn validate(&self, text: &str) -> bool {
        match self {
            ValidatorKind::Nip => is_valid_nip(text),
            ValidatorKind::Regon => is_valid_regon(text),
            ValidatorKind::Pesel => is_valid_pesel(text),
            ValidatorKind::Luhn => is_valid_credit_card(text),
            ValidatorKind::Iban => is_valid_iban(text),
            ValidatorKind::UsSsn => is_valid_us_ssn(text),
            ValidatorKind::CaSin => is_valid_ca_sin(text),
            ValidatorKind::AuTfn => is_valid_au_tfn(text),
            ValidatorKind::UkNino => is_valid_uk_nino(text),
            ValidatorKind::UkNhs => is_valid_uk_nhs(text),
            ValidatorKind::AuMedicare => is_valid_au_medicare(text),
            ValidatorKind::UsPassport => is_valid_us_passport(text),
            ValidatorKind::PhoneFormat => is_valid_phone_format(text),
            ValidatorKind::DateFormat => is_valid_iso_date_format(text),
        }
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ValidatorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for ValidatorKind {
    type Err = PiiSiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let kind = match key.as_str() {
            "nip" | "checksum_nip" => ValidatorKind::Nip,
            "regon" | "checksum_regon" => ValidatorKind::Regon,
            "pesel" | "checksum_pesel" => ValidatorKind::Pesel,
            "luhn" | "credit_card" => ValidatorKind::Luhn,
            "iban" => ValidatorKind::Iban,
            "us_ssn" | "ssn" => ValidatorKind::UsSsn,
            "ca_sin" | "sin" => ValidatorKind::CaSin,
            "au_tfn" | "tfn" => ValidatorKind::AuTfn,
            "uk_nino" | "nino" => ValidatorKind::UkNino,
            "uk_nhs" | "nhs" => ValidatorKind::UkNhs,
            "au_medicare" | "medicare" => ValidatorKind::AuMedicare,
            "us_passport" | "passport" => ValidatorKind::UsPassport,
            "phone_format" | "phone" => ValidatorKind::PhoneFormat,
            "date_format" | "date" => ValidatorKind::DateFormat,
            _ => {
                return Err(PiiSiftError::Config(format!(
                    "unknown validator binding '{}'",
                    s
                )))
            }
        };
        Ok(kind)
    }
}
