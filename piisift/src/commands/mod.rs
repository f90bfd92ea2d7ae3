// piisift/src/commands/mod.rs
//! Subcommand implementations and the configuration loading they share.

pub mod analyze;
pub mod health;
pub mod modes;
pub mod patterns;
pub mod validate;

use anyhow::Result;
use log::debug;
use std::path::Path;

use piisift_core::{
    load_mode_table_by_name, merge_modes, merge_recognizers, validate_recognizers, ModeTable,
    RecognizerConfig,
};

use crate::cli::ConfigArgs;

/// Built-in recognizers with an optional user file merged over them.
pub fn load_recognizers(user_path: Option<&Path>) -> Result<RecognizerConfig> {
    let defaults = RecognizerConfig::load_default_recognizers()?;
    let user = user_path.map(RecognizerConfig::load_from_file).transpose()?;
    let merged = merge_recognizers(defaults, user);
    validate_recognizers(&merged.recognizers)?;
    debug!("Using {} recognizers.", merged.recognizers.len());
    Ok(merged)
}

/// Built-in modes with an optional user table (path or name) merged over them.
pub fn load_modes(user: Option<&str>) -> Result<ModeTable> {
    let defaults = ModeTable::load_default_modes()?;
    let user = user.map(load_mode_table_by_name).transpose()?;
    merge_modes(defaults, user)
}

pub fn load_config(args: &ConfigArgs) -> Result<(RecognizerConfig, ModeTable)> {
    Ok((
        load_recognizers(args.recognizers.as_deref())?,
        load_modes(args.modes.as_deref())?,
    ))
}
