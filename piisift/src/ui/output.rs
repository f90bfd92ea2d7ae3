// piisift/src/ui/output.rs
//! Colored status messages on stderr and verdict lines on stdout.
//!
//! Color is applied only when the target stream is a terminal, so piped output
//! and test captures stay plain.

use is_terminal::IsTerminal;
use owo_colors::{AnsiColors, OwoColorize};
use std::io::{self, Write};

/// The logical parts of the output that get a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Success,
    Info,
    Warn,
    Error,
}

impl Tone {
    pub fn color(self) -> AnsiColors {
        match self {
            Tone::Header => AnsiColors::BrightCyan,
            Tone::Success => AnsiColors::Green,
            Tone::Info => AnsiColors::BrightBlack,
            Tone::Warn => AnsiColors::Yellow,
            Tone::Error => AnsiColors::Red,
        }
    }
}

/// Returns `text` colored for `tone` when `enable_colors` is set.
pub fn paint(text: &str, tone: Tone, enable_colors: bool) -> String {
    if enable_colors {
        text.color(tone.color()).to_string()
    } else {
        text.to_string()
    }
}

/// Writes one line to `writer`.
pub fn print_line<W: Write>(writer: &mut W, text: &str, tone: Tone, enable_colors: bool) -> io::Result<()> {
    writeln!(writer, "{}", paint(text, tone, enable_colors))
}

pub fn stdout_supports_color() -> bool {
    io::stdout().is_terminal()
}

/// Prints an error message to stderr.
pub fn error_msg(msg: impl AsRef<str>) {
    let colors = io::stderr().is_terminal();
    let _ = print_line(&mut io::stderr(), &format!("Error: {}", msg.as_ref()), Tone::Error, colors);
}

/// Prints a warning message to stderr.
pub fn warn_msg(msg: impl AsRef<str>) {
    let colors = io::stderr().is_terminal();
    let _ = print_line(&mut io::stderr(), msg.as_ref(), Tone::Warn, colors);
}
