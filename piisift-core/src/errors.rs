//! errors.rs - Custom error types for the piisift-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! Every variant maps onto a stable machine-readable [`ErrorCode`] so that
//! outer surfaces can report it without string matching.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::sanitizers::compiler::PatternRejection;

/// Stable error codes exposed to callers of the health, config and analyze surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MalformedInput,
    PatternRejected,
    ModeInvalid,
    AnalyzerUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MalformedInput => "MALFORMED_INPUT",
            ErrorCode::PatternRejected => "PATTERN_REJECTED",
            ErrorCode::ModeInvalid => "MODE_INVALID",
            ErrorCode::AnalyzerUnavailable => "ANALYZER_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// This enum represents all possible error types in the `piisift-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PiiSiftError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Recognizer configuration rejected {} pattern(s):\n{}", .0.len(), format_rejections(.0))]
    PatternRejected(Vec<PatternRejection>),

    #[error("Unknown detection mode '{requested}'. Available modes: {}", .available.join(", "))]
    ModeInvalid {
        requested: String,
        available: Vec<String>,
    },

    #[error("Analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl PiiSiftError {
    /// Maps the error onto its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PiiSiftError::MalformedInput(_) => ErrorCode::MalformedInput,
            PiiSiftError::PatternRejected(_) => ErrorCode::PatternRejected,
            PiiSiftError::ModeInvalid { .. } => ErrorCode::ModeInvalid,
            PiiSiftError::AnalyzerUnavailable(_) => ErrorCode::AnalyzerUnavailable,
            PiiSiftError::Internal(_)
            | PiiSiftError::Config(_)
            | PiiSiftError::IoError(_)
            | PiiSiftError::Yaml(_) => ErrorCode::InternalError,
        }
    }
}

fn format_rejections(rejections: &[PatternRejection]) -> String {
    rejections
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<String>>()
        .join("\n")
}

/// Serializable error body for outer surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&PiiSiftError> for ErrorReport {
    fn from(err: &PiiSiftError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::AnalyzerUnavailable).unwrap();
        assert_eq!(json, "\"ANALYZER_UNAVAILABLE\"");
    }

    #[test]
    fn mode_invalid_lists_available_modes() {
        let err = PiiSiftError::ModeInvalid {
            requested: "paranoid".to_string(),
            available: vec!["balanced".to_string(), "high_precision".to_string()],
        };
        assert_eq!(err.code(), ErrorCode::ModeInvalid);
        assert!(err.to_string().contains("balanced, high_precision"));
    }
}
