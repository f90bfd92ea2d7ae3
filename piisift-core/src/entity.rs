// piisift-core/src/entity.rs
//! Core data structures for candidate spans and analysis verdicts, plus the
//! PII-safe logging helpers used wherever matched text could reach a log line.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PIISIFT_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// A raw span reported by a recognizer, before any filtering.
///
/// Offsets are UTF-8 byte offsets into the analysed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    #[serde(alias = "type")]
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    /// Text as the recognizer saw it. The pipeline re-slices the input and
    /// treats the slice as authoritative.
    #[serde(default)]
    pub text: String,
    pub score: f64,
    #[serde(default, alias = "recognizer")]
    pub recognizer_id: String,
}

/// Why a candidate was not accepted. Filters run in a fixed order, so the
/// reason names the first filter that refused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    AllowList,
    Pronoun,
    SingleWord,
    AllCaps,
    /// Name-like span without a single capitalized token.
    Lowercase,
    InvalidChecksum,
    LowScore,
    InternalError,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::AllowList => "ALLOW_LIST",
            RejectionReason::Pronoun => "PRONOUN",
            RejectionReason::SingleWord => "SINGLE_WORD",
            RejectionReason::AllCaps => "ALL_CAPS",
            RejectionReason::Lowercase => "LOWERCASE",
            RejectionReason::InvalidChecksum => "INVALID_CHECKSUM",
            RejectionReason::LowScore => "LOW_SCORE",
            RejectionReason::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate that passed every filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedEntity {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Score after context enhancement.
    pub score: f64,
    pub base_score: f64,
    pub recognizer_id: String,
    #[serde(default)]
    pub context_boosted: bool,
}

/// A candidate refused by a filter, reported only on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntity {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub score: f64,
    pub recognizer_id: String,
    pub reason: RejectionReason,
    /// Stable hash of the normalized text for correlation without the raw value.
    pub fingerprint: String,
}

/// Per-request counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub by_reason: BTreeMap<RejectionReason, usize>,
}

impl AnalysisStats {
    pub(crate) fn record_rejection(&mut self, reason: RejectionReason) {
        self.rejected += 1;
        *self.by_reason.entry(reason).or_insert(0) += 1;
    }
}

/// The verdict for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub mode: String,
    pub generation: u64,
    pub context_enhancement: bool,
    /// Accepted entities in candidate input order.
    pub entities: Vec<AcceptedEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<Vec<RejectedEntity>>,
    pub stats: AnalysisStats,
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

/// The text as it may appear in a log line.
pub fn loggable(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_rejection_debug(entity_type: &str, text: &str, reason: RejectionReason) {
    debug!(
        target: "piisift_core::pipeline",
        "Rejected {} '{}': {}",
        entity_type,
        loggable(text),
        reason
    );
}

pub fn log_acceptance_debug(entity_type: &str, text: &str, score: f64) {
    debug!(
        target: "piisift_core::pipeline",
        "Accepted {} '{}' (score {:.3})",
        entity_type,
        loggable(text),
        score
    );
}

/// SHA-256 over the entity type and the whitespace-normalized, lowercased text.
pub fn canonical_sample_hash(entity_type: &str, snippet: &str) -> String {
    let normalized = snippet
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(entity_type.as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_long_string() {
        assert_eq!(redact_sensitive("92032100157"), "[REDACTED: 11 chars]".to_string());
    }

    #[test]
    fn test_canonical_sample_hash_consistency() {
        let h1 = canonical_sample_hash("PERSON", "Jan  Kowalski ");
        let h2 = canonical_sample_hash("PERSON", "jan kowalski");
        assert_eq!(h1, h2);
        assert_ne!(h1, canonical_sample_hash("PL_NIP", "jan kowalski"));
    }

    #[test]
    fn candidate_accepts_external_field_names() {
        let json = r#"{"type":"PERSON","start":0,"end":3,"score":0.9,"recognizer":"spacy"}"#;
        let c: CandidateMatch = serde_json::from_str(json).unwrap();
        assert_eq!(c.entity_type, "PERSON");
        assert_eq!(c.recognizer_id, "spacy");
        assert!(c.text.is_empty());
    }

    #[test]
    fn reasons_serialize_as_codes() {
        let mut stats = AnalysisStats::default();
        stats.record_rejection(RejectionReason::AllowList);
        stats.record_rejection(RejectionReason::AllowList);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"ALLOW_LIST\":2"));
    }
}
