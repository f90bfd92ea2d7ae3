// File: piisift-core/src/headless.rs

//! `headless.rs`
//! Convenience wrapper for one-shot analysis without a long-lived store.
//! Builds a snapshot for the requested mode, runs one request and drops it.

use anyhow::{Context, Result};

use crate::config::RecognizerConfig;
use crate::entity::AnalysisResult;
use crate::modes::ModeTable;
use crate::pipeline::{analyze, AnalysisRequest};
use crate::snapshot::{ModeSwitchRequest, SnapshotStore};

/// Options for [`headless_analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// Mode to run in; `None` uses the table's default mode.
    pub mode: Option<String>,
    pub enable_context_enhancement: bool,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            mode: None,
            enable_context_enhancement: true,
        }
    }
}

/// Analyses a single request end to end.
///
/// # Arguments
///
/// * `recognizers` - The merged recognizer definitions (defaults + optional user file).
/// * `modes` - The merged mode table.
/// * `options` - Mode selection and context enhancement.
/// * `request` - The text and candidates to analyse.
pub fn headless_analyze(
    recognizers: RecognizerConfig,
    modes: ModeTable,
    options: &HeadlessOptions,
    request: &AnalysisRequest,
) -> Result<AnalysisResult> {
    let mode = options
        .mode
        .clone()
        .unwrap_or_else(|| modes.default_mode.clone());
    let store = SnapshotStore::new(recognizers, modes);
    store
        .switch_mode(&ModeSwitchRequest {
            mode: mode.clone(),
            enable_context_enhancement: options.enable_context_enhancement,
        })
        .with_context(|| format!("Failed to load detection mode '{}'", mode))?;

    Ok(analyze(&store, request)?)
}
