// File: piisift-core/src/registry.rs
//! The immutable recognizer registry.
//!
//! A [`Registry`] is built once per snapshot from recognizer definitions: every
//! pattern is admitted by the safe pattern compiler, validator bindings are
//! resolved per entity type and context keywords are compiled into a scanner.
//! After construction nothing in it changes; a new mode or a reload builds a
//! new registry.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use std::collections::HashMap;
use std::time::Duration;

use piisift_context::context::DEFAULT_CONTEXT_WINDOW;
use piisift_context::ContextScanner;

use crate::config::RecognizerDefinition;
use crate::entity::CandidateMatch;
use crate::errors::PiiSiftError;
use crate::filters::canonical_entity_type;
use crate::sanitizers::compiler::{compile_recognizers, CompiledPattern};
use crate::validators::ValidatorKind;

/// A recognizer whose patterns passed the compiler.
#[derive(Debug)]
pub struct CompiledRecognizer {
    pub definition: RecognizerDefinition,
    pub patterns: Vec<CompiledPattern>,
    context: ContextScanner,
}

impl CompiledRecognizer {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn entity_type(&self) -> &str {
        &self.definition.entity_type
    }

    /// True when one of this recognizer's keywords occurs near the span.
    pub fn has_context(&self, text: &str, start: usize, end: usize) -> bool {
        self.context.keyword_count() > 0
            && self
                .context
                .has_context(text.as_bytes(), start, end, DEFAULT_CONTEXT_WINDOW)
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    recognizers: Vec<CompiledRecognizer>,
    validators: HashMap<String, ValidatorKind>,
}

impl Registry {
    /// Builds a registry, compiling every pattern within `probe_budget`.
    ///
    /// Fails with `PatternRejected` listing every refused pattern, or with
    /// `Config` when two recognizers of one entity type bind different validators.
    pub fn build(
        definitions: Vec<RecognizerDefinition>,
        probe_budget: Duration,
    ) -> Result<Self, PiiSiftError> {
        let mut validators: HashMap<String, ValidatorKind> = HashMap::new();
        for def in &definitions {
            let Some(kind) = def.validator else { continue };
            let entity = canonical_entity_type(&def.entity_type).to_string();
            match validators.get(&entity) {
                Some(existing) if *existing != kind => {
                    return Err(PiiSiftError::Config(format!(
                        "entity type '{}' is bound to both '{}' and '{}'",
                        entity, existing, kind
                    )));
                }
                _ => {
                    validators.insert(entity, kind);
                }
            }
        }

        let compiled = compile_recognizers(&definitions, probe_budget)?;

        let mut recognizers = Vec::with_capacity(definitions.len());
        for (definition, patterns) in definitions.into_iter().zip(compiled) {
            let keywords: Vec<&str> = definition
                .context
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .collect();
            let context = ContextScanner::new(&keywords).map_err(|e| {
                PiiSiftError::Config(format!(
                    "recognizer '{}': context keywords: {}",
                    definition.name, e
                ))
            })?;
            debug!(
                "Recognizer '{}' ready: {} patterns, {} context keywords.",
                definition.name,
                patterns.len(),
                context.keyword_count()
            );
            recognizers.push(CompiledRecognizer {
                definition,
                patterns,
                context,
            });
        }

        info!(
            "Registry built with {} recognizers and {} validator bindings.",
            recognizers.len(),
            validators.len()
        );
        Ok(Self {
            recognizers,
            validators,
        })
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    pub fn recognizers(&self) -> &[CompiledRecognizer] {
        &self.recognizers
    }

    pub fn recognizer_names(&self) -> Vec<String> {
        self.recognizers.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn recognizer(&self, name: &str) -> Option<&CompiledRecognizer> {
        self.recognizers.iter().find(|r| r.name() == name)
    }

    /// The validator bound to an entity type, if any.
    pub fn validator_for(&self, entity_type: &str) -> Option<ValidatorKind> {
        self.validators
            .get(canonical_entity_type(entity_type))
            .copied()
    }

    /// Context lookup for a candidate: its own recognizer when known, else any
    /// recognizer of the same entity type.
    pub fn has_context(&self, candidate: &CandidateMatch, text: &str) -> bool {
        if let Some(rec) = self.recognizer(&candidate.recognizer_id) {
            return rec.has_context(text, candidate.start, candidate.end);
        }
        let entity = canonical_entity_type(&candidate.entity_type);
        self.recognizers
            .iter()
            .filter(|r| canonical_entity_type(r.entity_type()) == entity)
            .any(|r| r.has_context(text, candidate.start, candidate.end))
    }

    /// Runs every compiled pattern over `text` and emits candidates.
    ///
    /// `language` restricts recognizers to those supporting it; `entities`
    /// restricts the emitted entity types. Output is sorted by start offset,
    /// then by recognizer order.
    pub fn scan(
        &self,
        text: &str,
        language: Option<&str>,
        entities: Option<&[String]>,
    ) -> Vec<CandidateMatch> {
        let mut found: Vec<(usize, CandidateMatch)> = Vec::new();

        for (order, rec) in self.recognizers.iter().enumerate() {
            if let Some(lang) = language {
                if !rec.definition.supports_language(lang) {
                    continue;
                }
            }
            if let Some(wanted) = entities {
                let entity = canonical_entity_type(rec.entity_type());
                if !wanted.iter().any(|e| canonical_entity_type(e) == entity) {
                    continue;
                }
            }
            for pattern in &rec.patterns {
                for m in pattern.regex.find_iter(text) {
                    if m.start() == m.end() {
                        continue;
                    }
                    found.push((
                        order,
                        CandidateMatch {
                            entity_type: rec.entity_type().to_string(),
                            start: m.start(),
                            end: m.end(),
                            text: m.as_str().to_string(),
                            score: pattern.score,
                            recognizer_id: rec.name().to_string(),
                        },
                    ));
                }
            }
        }

        found.sort_by(|(oa, a), (ob, b)| a.start.cmp(&b.start).then(oa.cmp(ob)).then(a.end.cmp(&b.end)));
        // Several patterns of one recognizer may hit the same span.
        found.dedup_by(|(_, b), (_, a)| {
            a.start == b.start && a.end == b.end && a.recognizer_id == b.recognizer_id
        });
        debug!(
            target: "piisift_core::pipeline",
            "Pattern scan produced {} candidates.",
            found.len()
        );
        found.into_iter().map(|(_, c)| c).collect()
    }
}
