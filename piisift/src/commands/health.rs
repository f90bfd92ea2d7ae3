// piisift/src/commands/health.rs
//! `piisift health`: build the snapshot the way a service would at startup and
//! report on it.

use anyhow::Result;
use std::io::Write;

use piisift_core::{HealthStatus, SnapshotStore};

use crate::cli::ConfigArgs;
use crate::commands::load_config;
use crate::ui::output::warn_msg;

/// Prints the health report as JSON. Returns `true` when initialized.
///
/// A failed build is not an error here: it is exactly what the report is for.
pub fn run_health<W: Write>(args: &ConfigArgs, out: &mut W) -> Result<bool> {
    let (recognizers, modes) = load_config(args)?;
    let store = SnapshotStore::new(recognizers, modes);
    if let Err(err) = store.initialize() {
        warn_msg(format!("Initial snapshot build failed: {}", err));
    }
    let report = store.health();
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(report.status == HealthStatus::Initialized)
}
