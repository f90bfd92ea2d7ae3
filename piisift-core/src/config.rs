//! Recognizer configuration management for `piisift-core`.
//!
//! This module defines the declarative recognizer definitions: a named entity
//! type, the patterns that find it, optional context keywords and an optional
//! checksum validator binding. It handles YAML (de)serialization and provides
//! utilities for loading, merging and validating these definitions.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::errors::PiiSiftError;
use crate::validators::ValidatorKind;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single named pattern of a recognizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PatternDef {
    /// Pattern identifier, unique within its recognizer.
    pub name: String,
    /// The regex source.
    pub regex: String,
    /// Base score attached to every match of this pattern.
    pub score: f64,
}

/// A recognizer as written in configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecognizerDefinition {
    /// Unique identifier, also used as the recognizer id of emitted candidates.
    pub name: String,
    /// Entity type emitted on match (e.g. "PL_PESEL").
    #[serde(alias = "supported_entity")]
    pub entity_type: String,
    /// Language code the recognizer applies to, or `any`.
    #[serde(default = "default_language", alias = "supported_language")]
    pub language: String,
    /// Keywords whose presence near a match raises its score.
    #[serde(default, alias = "context_keywords")]
    pub context: Vec<String>,
    pub patterns: Vec<PatternDef>,
    /// Checksum or structural validator run on every candidate of this entity type.
    #[serde(default)]
    pub validator: Option<ValidatorKind>,
}

fn default_language() -> String {
    "any".to_string()
}

impl RecognizerDefinition {
    /// True when the recognizer should run for a request in `language`.
    pub fn supports_language(&self, language: &str) -> bool {
        self.language == "any" || self.language.eq_ignore_ascii_case(language)
    }
}

/// Top-level recognizer configuration file.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecognizerConfig {
    #[serde(default)]
    pub recognizers: Vec<RecognizerDefinition>,
}

impl RecognizerConfig {
    /// Loads recognizer definitions from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom recognizers from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recognizer file {}", path.display()))?;
        let config: RecognizerConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse recognizer file {}", path.display()))?;

        validate_recognizers(&config.recognizers)
            .with_context(|| format!("Invalid recognizer file {}", path.display()))?;
        info!(
            "Loaded {} recognizers from file {}.",
            config.recognizers.len(),
            path.display()
        );

        Ok(config)
    }

    /// Loads the built-in recognizer set from the embedded configuration.
    pub fn load_default_recognizers() -> Result<Self> {
        debug!("Loading default recognizers from embedded string...");
        let default_yaml = include_str!("../config/default_recognizers.yaml");
        let config: RecognizerConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default recognizers")?;
        validate_recognizers(&config.recognizers).context("Invalid default recognizers")?;

        debug!("Loaded {} default recognizers.", config.recognizers.len());
        Ok(config)
    }

    /// Returns the definitions named in `enabled`, in configuration order, or
    /// all of them when `enabled` is `None`.
    ///
    /// A name that does not exist is a configuration error rather than a
    /// warning, because a mode silently running without a recognizer it asked
    /// for would under-detect.
    pub fn select(&self, enabled: Option<&[String]>) -> Result<Vec<RecognizerDefinition>, PiiSiftError> {
        let Some(enabled) = enabled else {
            return Ok(self.recognizers.clone());
        };
        let wanted: HashSet<&str> = enabled.iter().map(String::as_str).collect();
        let known: HashSet<&str> = self.recognizers.iter().map(|r| r.name.as_str()).collect();

        let mut missing: Vec<&str> = wanted.difference(&known).copied().collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(PiiSiftError::Config(format!(
                "unknown recognizer(s) requested: {}",
                missing.join(", ")
            )));
        }

        let selected: Vec<RecognizerDefinition> = self
            .recognizers
            .iter()
            .filter(|r| wanted.contains(r.name.as_str()))
            .cloned()
            .collect();
        debug!(
            "Selected {} of {} recognizers.",
            selected.len(),
            self.recognizers.len()
        );
        Ok(selected)
    }
}

/// Merges user-defined recognizers over the defaults.
///
/// A user recognizer replaces the default with the same name in place; new
/// names are appended in the order they appear in the user file.
pub fn merge_recognizers(
    default_config: RecognizerConfig,
    user_config: Option<RecognizerConfig>,
) -> RecognizerConfig {
    debug!(
        "merge_recognizers called. Initial default recognizers count: {}",
        default_config.recognizers.len()
    );
    let mut merged = default_config.recognizers;

    if let Some(user_cfg) = user_config {
        debug!(
            "User config provided. Merging {} user recognizers.",
            user_cfg.recognizers.len()
        );
        let positions: HashMap<String, usize> = merged
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        for user_rec in user_cfg.recognizers {
            match positions.get(&user_rec.name) {
                Some(&i) => {
                    debug!("Overriding default recognizer '{}'.", user_rec.name);
                    merged[i] = user_rec;
                }
                None => merged.push(user_rec),
            }
        }
    }

    debug!("Final total recognizers after merge: {}", merged.len());
    RecognizerConfig {
        recognizers: merged,
    }
}

/// Validates definition integrity: names, scores and pattern presence.
///
/// Regex safety is checked later by the pattern compiler.
pub fn validate_recognizers(recognizers: &[RecognizerDefinition]) -> Result<()> {
    let mut names = HashSet::new();
    let mut errors = Vec::new();

    for rec in recognizers {
        if rec.name.trim().is_empty() {
            errors.push("A recognizer has an empty `name` field.".to_string());
        } else if !names.insert(rec.name.as_str()) {
            errors.push(format!("Duplicate recognizer name found: '{}'.", rec.name));
        }

        if rec.entity_type.trim().is_empty() {
            errors.push(format!("Recognizer '{}' has an empty `entity_type`.", rec.name));
        }

        if rec.patterns.is_empty() {
            errors.push(format!("Recognizer '{}' defines no patterns.", rec.name));
        }

        let mut pattern_names = HashSet::new();
        for pattern in &rec.patterns {
            if pattern.name.trim().is_empty() {
                errors.push(format!("Recognizer '{}' has a pattern with an empty name.", rec.name));
            } else if !pattern_names.insert(pattern.name.as_str()) {
                errors.push(format!(
                    "Recognizer '{}': duplicate pattern name '{}'.",
                    rec.name, pattern.name
                ));
            }
            if pattern.regex.is_empty() {
                errors.push(format!(
                    "Recognizer '{}': pattern '{}' has an empty `regex`.",
                    rec.name, pattern.name
                ));
            }
            if !(0.0..=1.0).contains(&pattern.score) {
                errors.push(format!(
                    "Recognizer '{}': pattern '{}' score {} is outside [0.0, 1.0].",
                    rec.name, pattern.name, pattern.score
                ));
            }
        }

        if rec.context.iter().any(|k| k.trim().is_empty()) {
            warn!("Recognizer '{}' has an empty context keyword; it will be ignored.", rec.name);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Recognizer validation failed:\n{}", errors.join("\n")))
    }
}
