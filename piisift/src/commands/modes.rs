// piisift/src/commands/modes.rs
//! `piisift modes`: the mode table as a terminal table.

use anyhow::Result;
use std::io::Write;

use crate::cli::ModesCommand;
use crate::commands::load_modes;
use crate::ui::output::{print_line, Tone};
use crate::ui::tables::modes_table;

pub fn run_modes<W: Write>(cmd: &ModesCommand, out: &mut W, enable_colors: bool) -> Result<()> {
    let modes = load_modes(cmd.modes.as_deref())?;
    print_line(
        out,
        &format!("{} detection modes (* = default)", modes.modes.len()),
        Tone::Header,
        enable_colors,
    )?;
    writeln!(out, "{}", modes_table(&modes))?;
    Ok(())
}
