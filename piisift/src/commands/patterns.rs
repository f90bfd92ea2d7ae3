// piisift/src/commands/patterns.rs
//! `piisift patterns FILE`: vet every pattern of a recognizer file.

use anyhow::Result;
use std::io::Write;
use std::time::Duration;

use piisift_core::{compile_recognizers, PiiSiftError, RecognizerConfig};

use crate::cli::PatternsCommand;
use crate::ui::output::{print_line, Tone};
use crate::ui::tables::rejections_table;

/// Returns `true` when every pattern compiled.
pub fn run_patterns<W: Write>(cmd: &PatternsCommand, out: &mut W, enable_colors: bool) -> Result<bool> {
    let config = RecognizerConfig::load_from_file(&cmd.path)?;
    let budget = Duration::from_millis(cmd.budget_ms);
    let total: usize = config.recognizers.iter().map(|r| r.patterns.len()).sum();

    match compile_recognizers(&config.recognizers, budget) {
        Ok(_) => {
            print_line(
                out,
                &format!(
                    "All {} patterns in {} recognizers compiled.",
                    total,
                    config.recognizers.len()
                ),
                Tone::Success,
                enable_colors,
            )?;
            Ok(true)
        }
        Err(PiiSiftError::PatternRejected(rejections)) => {
            print_line(
                out,
                &format!("{} of {} patterns rejected:", rejections.len(), total),
                Tone::Error,
                enable_colors,
            )?;
            writeln!(out, "{}", rejections_table(&rejections))?;
            Ok(false)
        }
        Err(other) => Err(other.into()),
    }
}
