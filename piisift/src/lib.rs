// piisift/src/lib.rs
//! # piisift CLI
//!
//! Command-line front end for `piisift-core`. Each subcommand is a thin
//! wrapper that loads configuration, calls into the core and renders the
//! result: JSON for machine-facing commands, tables for human-facing ones.
//!
//! License: MIT OR APACHE 2.0

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
