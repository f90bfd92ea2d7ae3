// piisift/src/cli.rs
//! This file defines the command-line interface (CLI) for the piisift application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "piisift",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turn raw PII detections into a filtered, scored verdict",
    long_about = "piisift post-processes candidate PII spans from an entity recognizer and its own pattern recognizers. It validates national and financial identifier checksums, drops name-like false positives, applies keyword context and enforces the thresholds of a detection mode.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG for the piisift crates to DEBUG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `piisift` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the post-processing pipeline and prints the result as JSON.
    #[command(about = "Analyse text and candidate spans, printing the verdict as JSON.")]
    Analyze(AnalyzeCommand),

    /// Runs a single validator against a value.
    #[command(about = "Check a value with one checksum or format validator.")]
    Validate(ValidateCommand),

    /// Compiles every pattern of a recognizer file through the safe compiler.
    #[command(about = "Vet the patterns of a recognizer YAML file.")]
    Patterns(PatternsCommand),

    /// Lists detection modes and their thresholds.
    #[command(about = "List detection modes and their thresholds.")]
    Modes(ModesCommand),

    /// Builds the snapshot and prints the health report.
    #[command(about = "Build the detection snapshot and print the health report as JSON.")]
    Health(ConfigArgs),
}

/// Recognizer and mode overrides shared by several commands.
#[derive(Parser, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Custom recognizer definitions merged over the built-in set.
    #[arg(long = "recognizers", value_name = "FILE", help = "Recognizer YAML merged over the built-in set.")]
    pub recognizers: Option<PathBuf>,

    /// Custom mode table merged over the built-in modes.
    #[arg(long = "modes", value_name = "NAME_OR_FILE", help = "Mode table YAML (path or name) merged over the built-in modes.")]
    pub modes: Option<String>,
}

/// Arguments for the `analyze` command.
#[derive(Parser, Debug)]
pub struct AnalyzeCommand {
    /// Text to analyse.
    #[arg(long, short = 't', conflicts_with = "input_file", help = "Text to analyse.")]
    pub text: Option<String>,

    /// Path to an input file (reads from stdin if neither --text nor --input-file is given).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read the text from a file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// JSON file with an array of candidate spans from an external recognizer.
    #[arg(long, short = 'c', value_name = "FILE", help = "JSON array of candidate spans from an external recognizer.")]
    pub candidates: Option<PathBuf>,

    /// Also run the built-in pattern recognizers over the text.
    #[arg(long, short = 's', help = "Also run the pattern recognizers over the text.")]
    pub scan: bool,

    /// Detection mode to run in.
    #[arg(long, short = 'm', value_name = "NAME", help = "Detection mode (defaults to the table's default mode).")]
    pub mode: Option<String>,

    /// Language code used to select recognizers.
    #[arg(long, short = 'l', value_name = "CODE", help = "Language code used to select recognizers.")]
    pub language: Option<String>,

    /// Restrict output to these entity types (comma-separated).
    #[arg(long, short = 'e', value_delimiter = ',', help = "Restrict output to these entity types (comma-separated).")]
    pub entities: Vec<String>,

    /// Extra allow-listed terms (comma-separated).
    #[arg(long, short = 'a', value_delimiter = ',', help = "Terms that are never PII (comma-separated).")]
    pub allow: Vec<String>,

    /// Include rejected candidates and their reasons in the output.
    #[arg(long = "surface-rejections", help = "Include rejected candidates and their reasons.")]
    pub surface_rejections: bool,

    /// Disable keyword context score boosting.
    #[arg(long = "no-context", help = "Disable keyword context score boosting.")]
    pub no_context: bool,

    /// Pretty-print the JSON output.
    #[arg(long, help = "Pretty-print the JSON output.")]
    pub pretty: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `validate` command.
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Validator name, e.g. `pesel`, `nip`, `luhn`, `iban`, `uk_nhs`.
    #[arg(value_name = "KIND", help = "Validator name (pesel, nip, regon, luhn, iban, us_ssn, ...).")]
    pub kind: String,

    /// The value to check.
    #[arg(value_name = "VALUE", help = "The value to check.")]
    pub value: String,
}

/// Arguments for the `patterns` command.
#[derive(Parser, Debug)]
pub struct PatternsCommand {
    /// The recognizer YAML file to vet.
    #[arg(value_name = "FILE", help = "The recognizer YAML file to vet.")]
    pub path: PathBuf,

    /// Per-pattern probe budget in milliseconds.
    #[arg(long = "budget-ms", value_name = "MS", default_value_t = 150, help = "Per-pattern probe budget in milliseconds.")]
    pub budget_ms: u64,
}

/// Arguments for the `modes` command.
#[derive(Parser, Debug)]
pub struct ModesCommand {
    /// Custom mode table merged over the built-in modes.
    #[arg(long = "modes", value_name = "NAME_OR_FILE", help = "Mode table YAML (path or name) merged over the built-in modes.")]
    pub modes: Option<String>,
}
