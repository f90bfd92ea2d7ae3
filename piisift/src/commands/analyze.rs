// piisift/src/commands/analyze.rs
//! `piisift analyze`: one request through the full pipeline, JSON out.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use piisift_core::{headless_analyze, AnalysisRequest, CandidateMatch, HeadlessOptions};

use crate::cli::AnalyzeCommand;
use crate::commands::load_config;

fn read_text(cmd: &AnalyzeCommand) -> Result<String> {
    if let Some(text) = &cmd.text {
        return Ok(text.clone());
    }
    if let Some(path) = &cmd.input_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read text from stdin")?;
    Ok(buf)
}

/// Reads a JSON array of candidates as produced by an upstream recognizer.
pub fn read_candidates(path: &Path) -> Result<Vec<CandidateMatch>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse candidates file {}", path.display()))
}

pub fn run_analyze<W: Write>(cmd: &AnalyzeCommand, out: &mut W) -> Result<()> {
    info!("Starting analyze operation.");
    let (recognizers, modes) = load_config(&cmd.config)?;

    let candidates = match &cmd.candidates {
        Some(path) => read_candidates(path)?,
        None => Vec::new(),
    };
    debug!("Loaded {} external candidates.", candidates.len());

    let request = AnalysisRequest {
        text: read_text(cmd)?,
        candidates,
        scan: cmd.scan,
        language: cmd.language.clone(),
        entities: (!cmd.entities.is_empty()).then(|| cmd.entities.clone()),
        allow_list: cmd.allow.clone(),
        surface_rejections: cmd.surface_rejections,
    };
    let options = HeadlessOptions {
        mode: cmd.mode.clone(),
        enable_context_enhancement: !cmd.no_context,
    };

    let result = headless_analyze(recognizers, modes, &options, &request)?;
    let json = if cmd.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    writeln!(out, "{}", json)?;
    info!(
        "Analyze finished: {} accepted, {} rejected.",
        result.stats.accepted, result.stats.rejected
    );
    Ok(())
}
