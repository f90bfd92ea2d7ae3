// File: piisift-core/src/validators/format.rs
//! Generic format validators that cut obvious false positives for phone
//! numbers and dates.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;

use super::{all_identical, ensure_input_len, extract_digits};

static ISO_DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("static ISO date regex"));

/// Rejects placeholder phone numbers.
///
/// Fewer than three digits, all-identical digits (`111-111-1111`) and ascending
/// runs that wrap from 9 to 0 (`1234567890`) are rejected.
pub fn is_valid_phone_format(phone: &str) -> bool {
    let Ok(digits) = extract_digits(phone) else {
        return false;
    };
    if digits.len() < 3 || all_identical(&digits) {
        return false;
    }
    let sequential = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    !sequential
}

/// Checks month and day ranges of an ISO `YYYY-MM-DD` prefix.
///
/// Input that does not start with an ISO date passes, leaving the decision
/// to the recognizer score.
pub fn is_valid_iso_date_format(date: &str) -> bool {
    if ensure_input_len(date).is_err() {
        return false;
    }
    let Some(caps) = ISO_DATE_REGEX.captures(date) else {
        return true;
    };
    let (Ok(month), Ok(day)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
        return false;
    };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return false;
    }
    match month {
        4 | 6 | 9 | 11 => day <= 30,
        2 => day <= 29,
        _ => true,
    }
}
