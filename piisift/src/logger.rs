// piisift/src/logger.rs
//! Logger setup for the piisift binary.
//!
//! `RUST_LOG` is honoured unless a level is forced from the command line.
//! Logs go to stderr so stdout stays clean JSON.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`.
///
/// With `forced = Some(level)`, the piisift crates log at `level` regardless
/// of `RUST_LOG`; other crates stay at `warn`. Calling it twice is harmless.
pub fn init_logger(forced: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr);

    if let Some(level) = forced {
        builder.filter_level(LevelFilter::Warn.min(level));
        for krate in ["piisift", "piisift_core", "piisift_context"] {
            builder.filter_module(krate, level);
        }
    }

    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags onto a forced level.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    match (quiet, debug) {
        (true, _) => Some(LevelFilter::Off),
        (false, true) => Some(LevelFilter::Debug),
        (false, false) => None,
    }
}
