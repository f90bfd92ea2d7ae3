//! compiler.rs - Safe compilation of recognizer patterns.
//!
//! Every pattern loaded from configuration passes through this gate before it
//! may run against live traffic. A pattern is rejected when its source is too
//! long, when it nests a quantified group inside another quantifier, when it
//! fails to compile, or when matching it against a set of adversarial probe
//! strings overruns a time budget.
//!
//! This is a load-time gate, not a proof of ReDoS immunity. It also keeps a
//! thread-safe cache of patterns that already passed, so rebuilding a registry
//! on a mode switch does not re-probe unchanged sources.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{mpsc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{PatternDef, RecognizerDefinition, MAX_PATTERN_LENGTH};
use crate::errors::PiiSiftError;

/// Upper bound on the compiled program size of a single pattern.
pub const COMPILED_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Default time allowed for one pattern to run over all probe strings.
pub const DEFAULT_PROBE_BUDGET: Duration = Duration::from_millis(150);

/// Why a pattern was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternRejectionReason {
    LengthExceeded,
    NestedQuantifier,
    SyntaxError,
    Timeout,
}

impl fmt::Display for PatternRejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternRejectionReason::LengthExceeded => "LENGTH_EXCEEDED",
            PatternRejectionReason::NestedQuantifier => "NESTED_QUANTIFIER",
            PatternRejectionReason::SyntaxError => "SYNTAX_ERROR",
            PatternRejectionReason::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

/// A structured rejection for one pattern of one recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRejection {
    pub recognizer: String,
    pub pattern: String,
    pub reason: PatternRejectionReason,
    pub detail: String,
}

impl fmt::Display for PatternRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {} ({})",
            self.recognizer, self.pattern, self.reason, self.detail
        )
    }
}

/// A pattern that passed every check, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    pub score: f64,
}

lazy_static! {
    /// Sources that already compiled and survived the probes.
    static ref SAFE_PATTERN_CACHE: RwLock<HashMap<String, Regex>> = RwLock::new(HashMap::new());

    /// Adversarial inputs that make backtracking engines explode.
    static ref PROBES: Vec<String> = {
        let mixed: String = "aZ0 x-9_Q.".chars().cycle().take(10 * 1024).collect();
        vec!["a".repeat(100) + "!", "x".repeat(1000), mixed]
    };
}

/// Structural heuristic for catastrophic backtracking: a group that contains
/// a quantifier and is itself immediately quantified, e.g. `(a+)+` or `(x+)*y`.
///
/// Escapes and character classes are skipped. The bounded optional `?` is not
/// treated as an outer quantifier.
pub fn has_nested_quantifier(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    // one flag per open group: does it contain a quantifier?
    let mut groups: Vec<bool> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            // `\p{Lu}` and `\x{41}` carry braces that are not a quantifier
            let braced = matches!(chars.get(i + 1), Some('p' | 'P' | 'x' | 'u' | 'U'))
                && chars.get(i + 2) == Some(&'{');
            i = if braced {
                chars[i + 2..]
                    .iter()
                    .position(|&ch| ch == '}')
                    .map_or(chars.len(), |close| i + 2 + close + 1)
            } else {
                i + 2
            };
            continue;
        }
        if in_class {
            if c == ']' {
                in_class = false;
            }
            i += 1;
            continue;
        }
        match c {
            '[' => in_class = true,
            '(' => groups.push(false),
            '+' | '*' | '{' => {
                if let Some(top) = groups.last_mut() {
                    *top = true;
                }
            }
            ')' => {
                let quantified_inside = groups.pop().unwrap_or(false);
                if quantified_inside {
                    if matches!(chars.get(i + 1), Some('+') | Some('*') | Some('{')) {
                        return true;
                    }
                    if let Some(parent) = groups.last_mut() {
                        *parent = true;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Runs `regex` over every probe on a worker thread and waits at most `budget`.
///
/// On timeout the worker is left to finish on its own; the caller only learns
/// that the pattern is too slow to admit.
fn probe_within_budget(regex: &Regex, budget: Duration) -> Result<Duration, Duration> {
    let (tx, rx) = mpsc::channel();
    let worker_regex = regex.clone();
    let started = Instant::now();

    let spawned = thread::Builder::new()
        .name("piisift-pattern-probe".to_string())
        .spawn(move || {
            let hits: usize = PROBES
                .iter()
                .map(|probe| worker_regex.find_iter(probe).count())
                .sum();
            let _ = tx.send(hits);
        });

    if spawned.is_err() {
        // No worker thread available: probe inline and judge by wall time.
        let hits: usize = PROBES.iter().map(|p| regex.find_iter(p).count()).sum();
        let elapsed = started.elapsed();
        debug!(target: "piisift_core::compiler", "Inline probe produced {} hits.", hits);
        return if elapsed > budget { Err(elapsed) } else { Ok(elapsed) };
    }

    match rx.recv_timeout(budget) {
        Ok(_) => Ok(started.elapsed()),
        Err(_) => Err(started.elapsed()),
    }
}

fn cached(source: &str) -> Option<Regex> {
    SAFE_PATTERN_CACHE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(source)
        .cloned()
}

/// Validates and compiles a single pattern.
///
/// # Arguments
///
/// * `recognizer` - Owning recognizer name, used in the rejection report.
/// * `pattern` - The pattern definition to compile.
/// * `budget` - Time allowed for the probe run.
///
/// # Returns
///
/// A [`CompiledPattern`] or a [`PatternRejection`] naming the first failed check.
pub fn compile_pattern(
    recognizer: &str,
    pattern: &PatternDef,
    budget: Duration,
) -> Result<CompiledPattern, PatternRejection> {
    let reject = |reason: PatternRejectionReason, detail: String| PatternRejection {
        recognizer: recognizer.to_string(),
        pattern: pattern.name.clone(),
        reason,
        detail,
    };
    let source = pattern.regex.as_str();

    if let Some(regex) = cached(source) {
        debug!(target: "piisift_core::compiler", "Pattern '{}/{}' served from cache.", recognizer, pattern.name);
        return Ok(CompiledPattern {
            name: pattern.name.clone(),
            regex,
            score: pattern.score,
        });
    }

    if source.chars().count() > MAX_PATTERN_LENGTH {
        return Err(reject(
            PatternRejectionReason::LengthExceeded,
            format!(
                "{} chars exceeds the limit of {}",
                source.chars().count(),
                MAX_PATTERN_LENGTH
            ),
        ));
    }

    if has_nested_quantifier(source) {
        return Err(reject(
            PatternRejectionReason::NestedQuantifier,
            "quantified group is itself quantified".to_string(),
        ));
    }

    let regex = RegexBuilder::new(source)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| reject(PatternRejectionReason::SyntaxError, e.to_string()))?;

    match probe_within_budget(&regex, budget) {
        Ok(elapsed) => {
            debug!(
                target: "piisift_core::compiler",
                "Pattern '{}/{}' compiled successfully (probe {:?}).",
                recognizer, pattern.name, elapsed
            );
        }
        Err(elapsed) => {
            return Err(reject(
                PatternRejectionReason::Timeout,
                format!("probe ran {:?}, budget {:?}", elapsed, budget),
            ));
        }
    }

    SAFE_PATTERN_CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(source.to_string(), regex.clone());

    Ok(CompiledPattern {
        name: pattern.name.clone(),
        regex,
        score: pattern.score,
    })
}

/// Compiles every pattern of every recognizer, collecting all rejections.
///
/// The output keeps the input order: one `Vec<CompiledPattern>` per recognizer.
/// Any rejection fails the whole batch with [`PiiSiftError::PatternRejected`],
/// so a half-compiled recognizer set never goes live.
pub fn compile_recognizers(
    recognizers: &[RecognizerDefinition],
    budget: Duration,
) -> Result<Vec<Vec<CompiledPattern>>, PiiSiftError> {
    debug!(
        target: "piisift_core::compiler",
        "Starting compilation of {} recognizers.",
        recognizers.len()
    );

    let mut compiled = Vec::with_capacity(recognizers.len());
    let mut rejections = Vec::new();

    for rec in recognizers {
        let mut patterns = Vec::with_capacity(rec.patterns.len());
        for pattern in &rec.patterns {
            match compile_pattern(&rec.name, pattern, budget) {
                Ok(p) => patterns.push(p),
                Err(rejection) => {
                    warn!(target: "piisift_core::compiler", "Pattern rejected: {}", rejection);
                    rejections.push(rejection);
                }
            }
        }
        compiled.push(patterns);
    }

    if !rejections.is_empty() {
        return Err(PiiSiftError::PatternRejected(rejections));
    }

    debug!(
        target: "piisift_core::compiler",
        "Finished compiling. Total patterns: {}.",
        compiled.iter().map(Vec::len).sum::<usize>()
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(regex: &str) -> PatternDef {
        PatternDef {
            name: "p".to_string(),
            regex: regex.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn accepts_structured_identifier_pattern() {
        let compiled = compile_pattern("nino", &def(r"\b[A-Z]{2}\d{6}\b"), DEFAULT_PROBE_BUDGET).unwrap();
        assert!(compiled.regex.is_match("ref AB123456 end"));
    }

    #[test]
    fn accepts_unicode_class_initials() {
        for source in [r"\b(?:\p{Lu}\.)+", r"(\p{L})+"] {
            assert!(compile_pattern("initials", &def(source), DEFAULT_PROBE_BUDGET).is_ok(), "{}", source);
        }
        let compiled = compile_pattern("initials", &def(r"\b(?:\p{Lu}\.)+"), DEFAULT_PROBE_BUDGET).unwrap();
        assert!(compiled.regex.is_match("podpisano J.K. Rowling"));
    }

    #[test]
    fn rejects_nested_quantifiers() {
        for source in [r"(a+)+$", r"(x+)*y", r"(a*)*b", r"((ab)+)+", r"(\d+){2,}"] {
            let err = compile_pattern("r", &def(source), DEFAULT_PROBE_BUDGET).unwrap_err();
            assert_eq!(err.reason, PatternRejectionReason::NestedQuantifier, "{}", source);
        }
    }

    #[test]
    fn nested_quantifier_heuristic_ignores_safe_shapes() {
        assert!(!has_nested_quantifier(r"\b\d{3}-\d{2}-\d{4}\b"));
        assert!(!has_nested_quantifier(r"(\d{3})?-\d+"));
        assert!(!has_nested_quantifier(r"[(a+)]+"));
        assert!(!has_nested_quantifier(r"\(a+\)+"));
        assert!(!has_nested_quantifier(r"(?:\p{Lu}\.)+"));
        assert!(!has_nested_quantifier(r"(\p{L})+"));
        assert!(!has_nested_quantifier(r"\b(?:\P{N}\x{2E})+"));
        assert!(has_nested_quantifier(r"(\p{L}+)+"));
        assert!(has_nested_quantifier(r"(?:\w+\s?)+"));
    }

    #[test]
    fn rejects_overlong_and_invalid_sources() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let err = compile_pattern("r", &def(&long), DEFAULT_PROBE_BUDGET).unwrap_err();
        assert_eq!(err.reason, PatternRejectionReason::LengthExceeded);

        let err = compile_pattern("r", &def(r"(unclosed"), DEFAULT_PROBE_BUDGET).unwrap_err();
        assert_eq!(err.reason, PatternRejectionReason::SyntaxError);
    }

    #[test]
    fn zero_budget_times_out() {
        let err = compile_pattern("r", &def(r"[a-z]{2,}[0-9]?q"), Duration::ZERO).unwrap_err();
        assert_eq!(err.reason, PatternRejectionReason::Timeout);
    }

    #[test]
    fn batch_collects_all_rejections() {
        let recs = vec![RecognizerDefinition {
            name: "bad".to_string(),
            entity_type: "X".to_string(),
            language: "any".to_string(),
            context: vec![],
            patterns: vec![def(r"(a+)+$"), PatternDef { name: "q".to_string(), ..def(r"(x+)*y") }],
            validator: None,
        }];
        match compile_recognizers(&recs, DEFAULT_PROBE_BUDGET) {
            Err(PiiSiftError::PatternRejected(list)) => assert_eq!(list.len(), 2),
            other => panic!("expected rejection, got {:?}", other.map(|v| v.len())),
        }
    }
}
