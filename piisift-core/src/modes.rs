// File: piisift-core/src/modes.rs

//! modes.rs - Detection mode configuration, loading, and lookup for piisift.
//!
//! A detection mode is a named bundle of per-entity score thresholds, a GLOBAL
//! fallback threshold and context-boost parameters. Modes trade recall against
//! precision: `high_recall` admits low-confidence candidates, `high_precision`
//! only keeps strong ones. A mode may also restrict the recognizer set and
//! carry a default allow-list of terms that are never PII (assistant personas,
//! product names).
//!
//! Mode tables are YAML. The built-in table is embedded; user tables can be
//! loaded from an explicit path or looked up by name in the usual config
//! directories, then merged over the defaults by mode name.
//!
//! license: MIT OR Apache-2.0

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::PiiSiftError;
use piisift_context::ContextBoost;

/// Key of the fallback threshold that every mode must define.
pub const GLOBAL_THRESHOLD_KEY: &str = "GLOBAL";

fn default_boost_factor() -> f64 {
    ContextBoost::default().factor
}

fn default_min_context_score() -> f64 {
    ContextBoost::default().min_score
}

/// A single named detection mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMode {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Entity type to minimum score. Must contain [`GLOBAL_THRESHOLD_KEY`].
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default = "default_boost_factor")]
    pub context_boost_factor: f64,
    #[serde(default = "default_min_context_score")]
    pub min_context_score: f64,
    /// Recognizers active in this mode; `None` means all.
    #[serde(default)]
    pub recognizers: Option<Vec<String>>,
    /// Terms always allowed in this mode, on top of the caller's allow-list.
    #[serde(default)]
    pub allow_list: Vec<String>,
}

impl DetectionMode {
    /// The GLOBAL fallback. A mode that somehow lacks one rejects everything.
    pub fn global_threshold(&self) -> f64 {
        self.thresholds
            .get(GLOBAL_THRESHOLD_KEY)
            .copied()
            .unwrap_or(1.0)
    }

    /// Threshold for `entity_type`, falling back to GLOBAL.
    pub fn threshold_for(&self, entity_type: &str) -> f64 {
        self.thresholds
            .get(entity_type)
            .copied()
            .unwrap_or_else(|| self.global_threshold())
    }

    pub fn context_boost(&self) -> ContextBoost {
        ContextBoost {
            factor: self.context_boost_factor,
            min_score: self.min_context_score,
        }
    }

    /// Checks threshold ranges and the presence of GLOBAL.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("A mode has an empty `name` field.");
        }
        if !self.thresholds.contains_key(GLOBAL_THRESHOLD_KEY) {
            bail!(
                "Mode '{}' validation failed: missing '{}' fallback threshold.",
                self.name,
                GLOBAL_THRESHOLD_KEY
            );
        }
        for (entity, value) in &self.thresholds {
            if !(0.0..=1.0).contains(value) {
                bail!(
                    "Mode '{}' validation failed: threshold for '{}' ({}) is outside [0.0, 1.0].",
                    self.name,
                    entity,
                    value
                );
            }
        }
        for (label, value) in [
            ("context_boost_factor", self.context_boost_factor),
            ("min_context_score", self.min_context_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!(
                    "Mode '{}' validation failed: '{}' ({}) is outside [0.0, 1.0].",
                    self.name,
                    label,
                    value
                );
            }
        }
        if let Some(list) = &self.recognizers {
            if list.is_empty() {
                warn!("Mode '{}' enables an empty recognizer list; only external candidates will be processed.", self.name);
            }
        }
        Ok(())
    }
}

/// The set of modes available to a process, plus the one used at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTable {
    pub default_mode: String,
    pub modes: Vec<DetectionMode>,
}

impl ModeTable {
    /// Loads the built-in mode table from the embedded configuration.
    pub fn load_default_modes() -> Result<Self> {
        debug!("Loading default modes from embedded string...");
        let default_yaml = include_str!("../config/default_modes.yaml");
        let table: ModeTable =
            serde_yml::from_str(default_yaml).context("Failed to parse default modes")?;
        table.validate().context("Invalid default modes")?;
        debug!("Loaded {} default modes.", table.modes.len());
        Ok(table)
    }

    /// Loads a mode table from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading mode file {}", path.display()))?;
        let table: ModeTable = serde_yml::from_str(&text)
            .with_context(|| format!("parsing mode YAML {}", path.display()))?;
        table
            .validate()
            .with_context(|| format!("validating mode file {}", path.display()))?;
        debug!("Loaded {} modes from {}.", table.modes.len(), path.display());
        Ok(table)
    }

    /// Validates every mode, name uniqueness and the default mode.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for mode in &self.modes {
            mode.validate()?;
            if !seen.insert(mode.name.as_str()) {
                bail!("Duplicate mode name found: '{}'.", mode.name);
            }
        }
        if !seen.contains(self.default_mode.as_str()) {
            return Err(anyhow!(
                "Default mode '{}' is not defined. Available modes: {}",
                self.default_mode,
                self.names().join(", ")
            ));
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.modes.iter().map(|m| m.name.clone()).collect()
    }

    /// Looks up a mode by name.
    pub fn get(&self, name: &str) -> Result<&DetectionMode, PiiSiftError> {
        self.modes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| PiiSiftError::ModeInvalid {
                requested: name.to_string(),
                available: self.names(),
            })
    }

    pub fn initial_mode(&self) -> Result<&DetectionMode, PiiSiftError> {
        self.get(&self.default_mode)
    }
}

/// Merges a user mode table over the defaults: same-named modes are replaced,
/// new ones appended, and the user's `default_mode` wins.
pub fn merge_modes(default_table: ModeTable, user_table: Option<ModeTable>) -> Result<ModeTable> {
    let Some(user) = user_table else {
        return Ok(default_table);
    };
    debug!("Merging {} user modes over {} defaults.", user.modes.len(), default_table.modes.len());

    let mut modes = default_table.modes;
    for user_mode in user.modes {
        match modes.iter_mut().find(|m| m.name == user_mode.name) {
            Some(slot) => *slot = user_mode,
            None => modes.push(user_mode),
        }
    }
    let merged = ModeTable {
        default_mode: user.default_mode,
        modes,
    };
    merged.validate()?;
    Ok(merged)
}

/// Candidate locations of a named mode table, in lookup order.
pub fn mode_table_candidate_paths(name: &str) -> Vec<PathBuf> {
    let base_dirs = vec![
        dirs::home_dir().map(|p| p.join(".piisift").join("modes")),
        dirs::config_dir().map(|p| p.join("piisift").join("modes")),
        Some(PathBuf::from("/etc/piisift/modes")),
        Some(PathBuf::from("./config")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(format!("{}.yaml", name)))
        .collect()
}

/// Loads a mode table from a path, or by name from the candidate directories.
pub fn load_mode_table_by_name(name_or_path: &str) -> Result<ModeTable> {
    debug!("Attempting to load mode table from: '{}'", name_or_path);

    let path = Path::new(name_or_path);
    let path_to_load = if path.is_file() {
        Some(path.to_path_buf())
    } else {
        mode_table_candidate_paths(name_or_path)
            .into_iter()
            .find(|p| p.is_file())
    }
    .context("Mode table not found. It is not a valid file path, and was not found in expected locations.")?;

    ModeTable::load_from_file(&path_to_load)
}
