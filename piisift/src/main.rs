// piisift/src/main.rs
//! piisift entry point.
//!
//! Exit codes: 0 on success, 1 when a check ran and failed (invalid value,
//! rejected pattern, degraded health), 2 on any error.

use clap::Parser;
use std::io;
use std::process::ExitCode;

use piisift::cli::{Cli, Commands};
use piisift::commands::{analyze, health, modes, patterns, validate};
use piisift::logger;
use piisift::ui::output::{error_msg, stdout_supports_color};

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let mut stdout = io::stdout().lock();
    let colors = stdout_supports_color();

    match &cli.command {
        Commands::Analyze(cmd) => analyze::run_analyze(cmd, &mut stdout).map(|_| true),
        Commands::Validate(cmd) => validate::run_validate(cmd, &mut stdout, colors),
        Commands::Patterns(cmd) => patterns::run_patterns(cmd, &mut stdout, colors),
        Commands::Modes(cmd) => modes::run_modes(cmd, &mut stdout, colors).map(|_| true),
        Commands::Health(args) => health::run_health(args, &mut stdout),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error_msg(format!("{:#}", err));
            ExitCode::from(2)
        }
    }
}
