// piisift/src/commands/validate.rs
//! `piisift validate KIND VALUE`: a single validator as a shell predicate.

use anyhow::Result;
use std::io::Write;

use piisift_core::validators::{card_brand, decode_pesel};
use piisift_core::ValidatorKind;

use crate::cli::ValidateCommand;
use crate::ui::output::{print_line, Tone};

/// Prints `valid` or `invalid` and returns whether the value passed.
///
/// Valid PESELs are followed by their decoded birth date and sex, valid card
/// numbers by their brand.
pub fn run_validate<W: Write>(cmd: &ValidateCommand, out: &mut W, enable_colors: bool) -> Result<bool> {
    let kind: ValidatorKind = cmd.kind.parse()?;
    let valid = match kind.try_validate(&cmd.value) {
        Ok(valid) => valid,
        Err(err) => {
            log::debug!("Validator '{}' refused input: {}", kind, err);
            false
        }
    };

    if !valid {
        print_line(out, "invalid", Tone::Error, enable_colors)?;
        return Ok(false);
    }
    print_line(out, "valid", Tone::Success, enable_colors)?;

    match kind {
        ValidatorKind::Pesel => {
            if let Some(birth) = decode_pesel(&cmd.value) {
                writeln!(
                    out,
                    "birth_date: {:04}-{:02}-{:02}\nsex: {}",
                    birth.year, birth.month, birth.day, birth.sex
                )?;
            }
        }
        ValidatorKind::Luhn => writeln!(out, "brand: {}", card_brand(&cmd.value))?,
        _ => {}
    }
    Ok(true)
}
