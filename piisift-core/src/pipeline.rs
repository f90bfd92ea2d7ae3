// File: piisift-core/src/pipeline.rs
//! The entity post-processing pipeline.
//!
//! Each candidate runs through a fixed sequence of filters; the first one that
//! refuses it names the rejection reason, so the order is part of the contract:
//!
//! 1. allow-list (every entity type)
//! 2. pronoun, 3. single word, 4. all caps (name-like types only)
//! 5. boundary trimming to the capitalized run, then 1-4 again on the result
//! 6. checksum gate for entity types with a bound validator
//! 7. threshold gate on the context-boosted score
//!
//! The pipeline is a pure function of its inputs and one [`Snapshot`]. A bad
//! candidate is rejected on its own; it never fails the batch.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use piisift_context::boost_score;

use crate::engine::{CandidateSource, PrecomputedCandidates};
use crate::entity::{
    canonical_sample_hash, log_acceptance_debug, log_rejection_debug, AcceptedEntity,
    AnalysisResult, AnalysisStats, CandidateMatch, RejectedEntity, RejectionReason,
};
use crate::errors::PiiSiftError;
use crate::filters::{
    canonical_entity_type, capitalized_run, contains_pronoun, has_name_structure, is_all_caps,
    is_name_like, AllowList,
};
use crate::snapshot::{Snapshot, SnapshotStore};

/// Longest text, in characters, accepted for analysis.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// One analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    /// Candidates from an external recognizer.
    #[serde(default)]
    pub candidates: Vec<CandidateMatch>,
    /// Also run the registry's own patterns over the text.
    #[serde(default)]
    pub scan: bool,
    #[serde(default)]
    pub language: Option<String>,
    /// Restricts output to these entity types.
    #[serde(default)]
    pub entities: Option<Vec<String>>,
    #[serde(default)]
    pub allow_list: Vec<String>,
    #[serde(default)]
    pub surface_rejections: bool,
}

/// Checks request-level preconditions on the text.
pub fn validate_text(text: &str) -> Result<(), PiiSiftError> {
    if text.trim().is_empty() {
        return Err(PiiSiftError::MalformedInput("text cannot be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(PiiSiftError::MalformedInput(format!(
            "text of {} characters exceeds the maximum of {}",
            chars, MAX_TEXT_CHARS
        )));
    }
    Ok(())
}

/// Analyses a request against the store's current snapshot.
///
/// Returns `AnalyzerUnavailable` when no snapshot was ever published and
/// `MalformedInput` for empty or oversized text. Everything after that is
/// recovered per candidate.
pub fn analyze(store: &SnapshotStore, request: &AnalysisRequest) -> Result<AnalysisResult, PiiSiftError> {
    let snapshot = store.current()?;
    analyze_with_snapshot(&snapshot, request)
}

/// Analyses a request against an explicit snapshot.
pub fn analyze_with_snapshot(
    snapshot: &Arc<Snapshot>,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, PiiSiftError> {
    validate_text(&request.text)?;

    let language = request.language.as_deref();
    let entities = request.entities.as_deref();
    let external = PrecomputedCandidates(request.candidates.clone());

    let mut sources: Vec<&dyn CandidateSource> = vec![&external];
    if request.scan {
        sources.push(&snapshot.registry);
    }

    let mut candidates = Vec::new();
    for source in sources {
        let found = source.candidates(&request.text, language, entities)?;
        debug!(
            target: "piisift_core::pipeline",
            "Source '{}' produced {} candidates.",
            source.source_name(),
            found.len()
        );
        candidates.extend(found);
    }
    let candidates = dedupe_candidates(candidates);

    let mut allow = AllowList::new(&snapshot.mode.allow_list);
    allow.extend(&request.allow_list);

    Ok(process_candidates(
        &request.text,
        snapshot,
        &candidates,
        &allow,
        request.surface_rejections,
    ))
}

fn score_in_range(score: f64) -> bool {
    score.is_finite() && (0.0..=1.0).contains(&score)
}

/// Collapses candidates that name the same entity type and span, as happens
/// when an external recognizer and the pattern scan both find an identifier.
/// The survivor keeps the position of the first report and the higher score.
fn dedupe_candidates(candidates: Vec<CandidateMatch>) -> Vec<CandidateMatch> {
    let total = candidates.len();
    let mut seen: HashMap<(String, usize, usize), usize> = HashMap::new();
    let mut kept: Vec<CandidateMatch> = Vec::with_capacity(total);

    for candidate in candidates {
        let key = (
            canonical_entity_type(&candidate.entity_type).to_string(),
            candidate.start,
            candidate.end,
        );
        match seen.get(&key) {
            Some(&i) => {
                let current = kept[i].score;
                if score_in_range(candidate.score) && (!score_in_range(current) || candidate.score > current) {
                    kept[i] = candidate;
                }
            }
            None => {
                seen.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    if kept.len() < total {
        debug!(
            target: "piisift_core::pipeline",
            "Collapsed {} duplicate candidates.",
            total - kept.len()
        );
    }
    kept
}

enum Verdict {
    Accept(AcceptedEntity),
    Reject(RejectedEntity),
}

/// Runs every candidate through the filter sequence.
///
/// Accepted entities keep the input order. Rejections are returned only when
/// `surface_rejections` is set; the per-reason counters always are.
pub fn process_candidates(
    text: &str,
    snapshot: &Snapshot,
    candidates: &[CandidateMatch],
    allow: &AllowList,
    surface_rejections: bool,
) -> AnalysisResult {
    let mut stats = AnalysisStats {
        candidates: candidates.len(),
        ..AnalysisStats::default()
    };
    let mut entities = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        match evaluate(text, snapshot, candidate, allow) {
            Verdict::Accept(entity) => {
                log_acceptance_debug(&entity.entity_type, &entity.text, entity.score);
                stats.accepted += 1;
                entities.push(entity);
            }
            Verdict::Reject(entity) => {
                log_rejection_debug(&entity.entity_type, &entity.text, entity.reason);
                stats.record_rejection(entity.reason);
                if surface_rejections {
                    rejected.push(entity);
                }
            }
        }
    }

    debug!(
        target: "piisift_core::pipeline",
        "Processed {} candidates in mode '{}': {} accepted, {} rejected.",
        stats.candidates,
        snapshot.mode.name,
        stats.accepted,
        stats.rejected
    );

    AnalysisResult {
        mode: snapshot.mode.name.clone(),
        generation: snapshot.generation,
        context_enhancement: snapshot.context_enhancement,
        entities,
        rejected: surface_rejections.then_some(rejected),
        stats,
    }
}

/// Filters 1 to 4. Only the allow-list applies to non-name types.
fn text_filters(
    span: &str,
    text: &str,
    start: usize,
    name_like: bool,
    allow: &AllowList,
) -> Option<RejectionReason> {
    if allow.matches(span) {
        return Some(RejectionReason::AllowList);
    }
    if !name_like {
        return None;
    }
    if contains_pronoun(span) {
        return Some(RejectionReason::Pronoun);
    }
    if !has_name_structure(span, text, start) {
        return Some(RejectionReason::SingleWord);
    }
    if is_all_caps(span) {
        return Some(RejectionReason::AllCaps);
    }
    None
}

fn in_bounds(text: &str, start: usize, end: usize) -> bool {
    start < end && end <= text.len() && text.is_char_boundary(start) && text.is_char_boundary(end)
}

fn evaluate(text: &str, snapshot: &Snapshot, candidate: &CandidateMatch, allow: &AllowList) -> Verdict {
    let entity_type = canonical_entity_type(&candidate.entity_type).to_string();
    let reject = |start: usize, end: usize, span: &str, score: f64, reason: RejectionReason| {
        Verdict::Reject(RejectedEntity {
            entity_type: entity_type.clone(),
            start,
            end,
            text: span.to_string(),
            score,
            recognizer_id: candidate.recognizer_id.clone(),
            reason,
            fingerprint: canonical_sample_hash(&entity_type, span),
        })
    };

    let (mut start, mut end) = (candidate.start, candidate.end);
    if !in_bounds(text, start, end) {
        warn!(
            target: "piisift_core::pipeline",
            "Candidate from '{}' has invalid offsets {}..{} for text of {} bytes.",
            candidate.recognizer_id,
            start,
            end,
            text.len()
        );
        return reject(start, end, &candidate.text, candidate.score, RejectionReason::InternalError);
    }
    if !score_in_range(candidate.score) {
        warn!(
            target: "piisift_core::pipeline",
            "Candidate from '{}' has out-of-range score {}.",
            candidate.recognizer_id,
            candidate.score
        );
        return reject(start, end, &text[start..end], 0.0, RejectionReason::InternalError);
    }
    if !candidate.text.is_empty() && candidate.text != text[start..end] {
        debug!(
            target: "piisift_core::pipeline",
            "Candidate text from '{}' differs from the input slice; using the slice.",
            candidate.recognizer_id
        );
    }

    let base = candidate.score;
    let name_like = is_name_like(&candidate.entity_type);
    let span = &text[start..end];

    if let Some(reason) = text_filters(span, text, start, name_like, allow) {
        return reject(start, end, span, base, reason);
    }

    if name_like {
        let Some((rel_start, rel_end)) = capitalized_run(span) else {
            return reject(start, end, span, base, RejectionReason::Lowercase);
        };
        if (rel_start, rel_end) != (0, span.len()) {
            let trimmed = &span[rel_start..rel_end];
            end = start + rel_end;
            start += rel_start;
            debug!(
                target: "piisift_core::pipeline",
                "Trimmed {} span to {}..{}.",
                entity_type,
                start,
                end
            );
            if let Some(reason) = text_filters(trimmed, text, start, name_like, allow) {
                return reject(start, end, trimmed, base, reason);
            }
        }
    }
    let span = &text[start..end];

    if let Some(kind) = snapshot.registry.validator_for(&entity_type) {
        match kind.try_validate(span) {
            Ok(true) => {}
            Ok(false) => return reject(start, end, span, base, RejectionReason::InvalidChecksum),
            Err(err) => {
                debug!(target: "piisift_core::pipeline", "Validator '{}' refused input: {}", kind, err);
                return reject(start, end, span, base, RejectionReason::InvalidChecksum);
            }
        }
    }

    let boosted = snapshot.context_enhancement && {
        let located = CandidateMatch {
            start,
            end,
            ..candidate.clone()
        };
        snapshot.registry.has_context(&located, text)
    };
    let score = boost_score(base, boosted, &snapshot.mode.context_boost());
    let threshold = snapshot.mode.threshold_for(&entity_type);
    if score < threshold {
        return reject(start, end, span, score, RejectionReason::LowScore);
    }

    Verdict::Accept(AcceptedEntity {
        entity_type,
        start,
        end,
        text: span.to_string(),
        score,
        base_score: base,
        recognizer_id: candidate.recognizer_id.clone(),
        context_boosted: boosted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ModeSwitchRequest;
    use crate::validators::MAX_VALIDATOR_INPUT;

    fn store() -> SnapshotStore {
        SnapshotStore::from_defaults().unwrap()
    }

    fn person(text: &str, needle: &str, score: f64) -> CandidateMatch {
        let start = text.find(needle).unwrap();
        CandidateMatch {
            entity_type: "PERSON".to_string(),
            start,
            end: start + needle.len(),
            text: needle.to_string(),
            score,
            recognizer_id: "spacy".to_string(),
        }
    }

    fn request(text: &str, candidates: Vec<CandidateMatch>) -> AnalysisRequest {
        AnalysisRequest {
            text: text.to_string(),
            candidates,
            surface_rejections: true,
            ..AnalysisRequest::default()
        }
    }

    fn only_reason(result: &AnalysisResult) -> RejectionReason {
        let rejected = result.rejected.as_ref().unwrap();
        assert_eq!(rejected.len(), 1);
        rejected[0].reason
    }

    #[test]
    fn accepts_full_name() {
        let text = "Please contact Jan Kowalski today.";
        let result = analyze(&store(), &request(text, vec![person(text, "Jan Kowalski", 0.85)])).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].text, "Jan Kowalski");
        assert_eq!(result.stats.accepted, 1);
    }

    #[test]
    fn pronoun_is_rejected() {
        let text = "Then He left.";
        let result = analyze(&store(), &request(text, vec![person(text, "He", 0.9)])).unwrap();
        assert_eq!(only_reason(&result), RejectionReason::Pronoun);
    }

    #[test]
    fn regnal_name_is_accepted() {
        let text = "Król Zygmunt I Stary zmarł w 1548";
        let result = analyze(&store(), &request(text, vec![person(text, "Zygmunt I Stary", 0.9)])).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].text, "Zygmunt I Stary");
    }

    #[test]
    fn allow_list_rejects_product_names() {
        let text = "I asked ChatGPT yesterday";
        let result = analyze(&store(), &request(text, vec![person(text, "ChatGPT", 0.9)])).unwrap();
        assert_eq!(only_reason(&result), RejectionReason::AllowList);
    }

    #[test]
    fn default_allow_lists_spare_common_given_names() {
        let store = store();
        let text = "The novel by Dan Brown sold well";
        for mode in ["high_recall", "balanced", "high_precision"] {
            store
                .switch_mode(&ModeSwitchRequest {
                    mode: mode.to_string(),
                    enable_context_enhancement: true,
                })
                .unwrap();
            let result = analyze(&store, &request(text, vec![person(text, "Dan Brown", 0.9)])).unwrap();
            assert_eq!(result.entities.len(), 1, "mode {}", mode);
            assert_eq!(result.entities[0].text, "Dan Brown");
        }
    }

    #[test]
    fn single_word_and_all_caps() {
        let text = "Kowalski said NASA JAN KOWALSKI";
        let result = analyze(
            &store(),
            &request(
                text,
                vec![person(text, "Kowalski", 0.9), person(text, "JAN KOWALSKI", 0.9)],
            ),
        )
        .unwrap();
        let reasons: Vec<_> = result.rejected.unwrap().iter().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![RejectionReason::SingleWord, RejectionReason::AllCaps]);
    }

    #[test]
    fn honorific_prefix_rescues_single_word() {
        let text = "Dr. Kowalski will see you";
        let result = analyze(&store(), &request(text, vec![person(text, "Kowalski", 0.9)])).unwrap();
        assert_eq!(result.entities.len(), 1);
    }

    #[test]
    fn trimming_narrows_offsets() {
        let text = "yesterday thanks Jan Kowalski for";
        let result = analyze(
            &store(),
            &request(text, vec![person(text, "thanks Jan Kowalski for", 0.9)]),
        )
        .unwrap();
        let entity = &result.entities[0];
        assert_eq!(entity.text, "Jan Kowalski");
        assert_eq!(&text[entity.start..entity.end], "Jan Kowalski");
    }

    #[test]
    fn trimmed_span_is_filtered_again() {
        let text = "met with Kowalski today";
        let result = analyze(
            &store(),
            &request(text, vec![person(text, "with Kowalski", 0.9)]),
        )
        .unwrap();
        let rejected = &result.rejected.unwrap()[0];
        assert_eq!(rejected.reason, RejectionReason::SingleWord);
        assert_eq!(rejected.text, "Kowalski");
    }

    #[test]
    fn lowercase_phrase_is_rejected() {
        let text = "powiedziec zbys";
        let result = analyze(&store(), &request(text, vec![person(text, "powiedziec zbys", 0.85)])).unwrap();
        assert_eq!(only_reason(&result), RejectionReason::Lowercase);
    }

    #[test]
    fn checksum_gate_ignores_score() {
        let text = "PESEL 92032100150";
        let mut candidate = person(text, "92032100150", 1.0);
        candidate.entity_type = "PL_PESEL".to_string();
        let result = analyze(&store(), &request(text, vec![candidate])).unwrap();
        assert_eq!(only_reason(&result), RejectionReason::InvalidChecksum);
    }

    #[test]
    fn out_of_bounds_candidate_does_not_fail_batch() {
        let text = "Jan Kowalski";
        let mut broken = person(text, "Jan Kowalski", 0.9);
        broken.end = 999;
        let good = person(text, "Jan Kowalski", 0.9);
        let result = analyze(&store(), &request(text, vec![broken, good])).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.stats.by_reason[&RejectionReason::InternalError], 1);
    }

    #[test]
    fn context_boost_lifts_low_pattern_score() {
        let store = store();
        let bare = analyze(
            &store,
            &AnalysisRequest {
                text: "ref 1234563218".to_string(),
                scan: true,
                entities: Some(vec!["PL_NIP".to_string()]),
                ..AnalysisRequest::default()
            },
        )
        .unwrap();
        assert!(bare.entities.is_empty());

        let with_context = analyze(
            &store,
            &AnalysisRequest {
                text: "NIP 1234563218".to_string(),
                scan: true,
                entities: Some(vec!["PL_NIP".to_string()]),
                ..AnalysisRequest::default()
            },
        )
        .unwrap();
        assert_eq!(with_context.entities.len(), 1);
        assert!(with_context.entities[0].context_boosted);
        assert!(with_context.entities[0].score > with_context.entities[0].base_score);
    }

    #[test]
    fn same_span_from_two_sources_is_reported_once() {
        let store = store();
        let text = "PESEL 92032100157";
        let external = |score: f64| CandidateMatch {
            entity_type: "PL_PESEL".to_string(),
            start: 6,
            end: 17,
            text: "92032100157".to_string(),
            score,
            recognizer_id: "ner".to_string(),
        };

        let mut req = request(text, vec![external(0.95)]);
        req.scan = true;
        let result = analyze(&store, &req).unwrap();
        assert_eq!(result.stats.candidates, 1);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].recognizer_id, "ner");
        assert_eq!(result.entities[0].base_score, 0.95);

        let mut req = request(text, vec![external(0.3)]);
        req.scan = true;
        let result = analyze(&store, &req).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].recognizer_id, "pl_pesel");
        assert_eq!(result.entities[0].base_score, 0.5);
    }

    #[test]
    fn duplicate_with_bad_score_does_not_hide_valid_report() {
        let text = "Jan Kowalski";
        let mut broken = person(text, "Jan Kowalski", 0.9);
        broken.score = f64::NAN;
        let good = person(text, "Jan Kowalski", 0.8);
        let kept = dedupe_candidates(vec![broken, good]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.8);
    }

    #[test]
    fn validator_fault_rejects_only_that_candidate() {
        let digits = "1".repeat(MAX_VALIDATOR_INPUT + 10);
        let text = format!("PESEL {} and Jan Kowalski", digits);
        let oversized = CandidateMatch {
            entity_type: "PL_PESEL".to_string(),
            start: 6,
            end: 6 + digits.len(),
            text: digits.clone(),
            score: 0.99,
            recognizer_id: "ner".to_string(),
        };
        let result = analyze(
            &store(),
            &request(&text, vec![oversized, person(&text, "Jan Kowalski", 0.9)]),
        )
        .unwrap();
        assert_eq!(only_reason(&result), RejectionReason::InvalidChecksum);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].text, "Jan Kowalski");
    }

    #[test]
    fn rejections_hidden_unless_requested() {
        let text = "Then He left.";
        let mut req = request(text, vec![person(text, "He", 0.9)]);
        req.surface_rejections = false;
        let result = analyze(&store(), &req).unwrap();
        assert!(result.rejected.is_none());
        assert_eq!(result.stats.rejected, 1);
    }

    #[test]
    fn oversized_and_empty_text_are_malformed() {
        let store = store();
        let big = "a".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(
            analyze(&store, &request(&big, vec![])),
            Err(PiiSiftError::MalformedInput(_))
        ));
        assert!(matches!(
            analyze(&store, &request("   ", vec![])),
            Err(PiiSiftError::MalformedInput(_))
        ));
    }
}
