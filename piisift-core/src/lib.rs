// piisift-core/src/lib.rs
//! # piisift Core Library
//!
//! `piisift-core` is the decision engine that sits between raw PII detections
//! and the caller. Candidates come from an external entity recognizer and from
//! the engine's own pattern recognizers; the engine validates checksums,
//! filters name-like false positives, applies keyword context and enforces the
//! thresholds of the active detection mode.
//!
//! ## Modules
//!
//! * `validators`: Pure checksum and structural validators for national and financial identifiers.
//! * `sanitizers`: The safe pattern compiler that refuses catastrophic regexes before use.
//! * `config`: Recognizer definitions loaded from YAML and merged over the built-in set.
//! * `modes`: Detection modes (thresholds, boost parameters, allow-lists) and mode tables.
//! * `registry`: The immutable set of compiled recognizers for one snapshot.
//! * `snapshot`: Atomic publication of (mode, registry) pairs, plus health reporting.
//! * `filters`: Allow-list, pronoun, structure, all-caps and boundary trimming heuristics.
//! * `entity`: Candidate, accepted and rejected entity records.
//! * `engine`: The `CandidateSource` trait for anything that produces candidates.
//! * `pipeline`: The fixed-order post-processing pipeline.
//! * `headless`: One-shot analysis without a long-lived store.
//! * `errors`: The error enum and its stable machine codes.
//!
//! ## Usage Example
//!
//! ```rust
//! use piisift_core::{AnalysisRequest, CandidateMatch, SnapshotStore, analyze};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     // 1. Build a store from the embedded recognizers and modes.
//!     let store = SnapshotStore::from_defaults()?;
//!
//!     // 2. Feed it text plus whatever an upstream NER model produced.
//!     let text = "Umowa z Jan Kowalski, PESEL 92032100157.";
//!     let request = AnalysisRequest {
//!         text: text.to_string(),
//!         candidates: vec![CandidateMatch {
//!             entity_type: "persName".to_string(),
//!             start: 8,
//!             end: 20,
//!             text: "Jan Kowalski".to_string(),
//!             score: 0.85,
//!             recognizer_id: "ner".to_string(),
//!         }],
//!         scan: true,
//!         ..AnalysisRequest::default()
//!     };
//!
//!     // 3. Everything that survives the pipeline is PII.
//!     let result = analyze(&store, &request)?;
//!     for entity in &result.entities {
//!         println!("{} {}..{} {:.2}", entity.entity_type, entity.start, entity.end, entity.score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Loaders return `anyhow::Error` with file context. Operations the outer
//! surfaces need to classify return [`PiiSiftError`], whose [`ErrorCode`] is
//! stable across releases.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod engine;
pub mod entity;
pub mod errors;
pub mod filters;
pub mod headless;
pub mod modes;
pub mod pipeline;
pub mod registry;
pub mod sanitizers;
pub mod snapshot;
pub mod validators;

/// Re-exports recognizer configuration types and loaders.
pub use config::{
    merge_recognizers, validate_recognizers, PatternDef, RecognizerConfig, RecognizerDefinition,
    MAX_PATTERN_LENGTH,
};

/// Re-exports the error type and its codes.
pub use errors::{ErrorCode, ErrorReport, PiiSiftError};

pub use engine::{CandidateSource, PrecomputedCandidates};

/// Re-exports entity records produced by the pipeline.
pub use entity::{
    canonical_sample_hash, redact_sensitive, AcceptedEntity, AnalysisResult, AnalysisStats,
    CandidateMatch, RejectedEntity, RejectionReason,
};

pub use filters::{canonical_entity_type, is_name_like, AllowList, NAME_LIKE_TYPES};

/// Re-exports detection modes and mode table helpers.
pub use modes::{
    load_mode_table_by_name, merge_modes, mode_table_candidate_paths, DetectionMode, ModeTable,
    GLOBAL_THRESHOLD_KEY,
};

pub use registry::{CompiledRecognizer, Registry};

/// Re-exports the snapshot store and its request/report types.
pub use snapshot::{
    HealthReport, HealthStatus, ModeConfigView, ModeSwitchOutcome, ModeSwitchRequest, Snapshot,
    SnapshotStore,
};

/// Re-exports the pipeline entry points.
pub use pipeline::{
    analyze, analyze_with_snapshot, process_candidates, validate_text, AnalysisRequest,
    MAX_TEXT_CHARS,
};

pub use headless::{headless_analyze, HeadlessOptions};

// Pattern compiler types for callers that vet recognizer files up front.
pub use sanitizers::compiler::{
    compile_pattern, compile_recognizers, CompiledPattern, PatternRejection,
    PatternRejectionReason, DEFAULT_PROBE_BUDGET,
};

pub use validators::ValidatorKind;
