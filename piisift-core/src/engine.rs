// piisift-core/src/engine.rs
//! Defines the `CandidateSource` trait: anything that turns text into raw
//! candidate spans for the post-processing pipeline.
//!
//! The registry's own pattern scan is one source. An external entity
//! recognition engine is another, reached through whatever transport the host
//! uses; it only has to produce [`CandidateMatch`]es. Precomputed candidate
//! lists implement the trait too, so tests and the CLI can feed fixed input.
//!
//! License: MIT OR APACHE 2.0

use crate::entity::CandidateMatch;
use crate::errors::PiiSiftError;
use crate::filters::canonical_entity_type;
use crate::registry::Registry;

/// A producer of raw candidate spans.
pub trait CandidateSource: Send + Sync {
    /// Identifier used in logs.
    fn source_name(&self) -> &str;

    /// Produces candidates for `text`.
    ///
    /// # Arguments
    /// * `text` - The input being analysed.
    /// * `language` - Optional language code to restrict recognizers.
    /// * `entities` - Optional list of entity types to restrict output.
    fn candidates(
        &self,
        text: &str,
        language: Option<&str>,
        entities: Option<&[String]>,
    ) -> Result<Vec<CandidateMatch>, PiiSiftError>;
}

impl CandidateSource for Registry {
    fn source_name(&self) -> &str {
        "pattern_registry"
    }

    fn candidates(
        &self,
        text: &str,
        language: Option<&str>,
        entities: Option<&[String]>,
    ) -> Result<Vec<CandidateMatch>, PiiSiftError> {
        Ok(self.scan(text, language, entities))
    }
}

/// A fixed candidate list, as received from an external recognizer.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedCandidates(pub Vec<CandidateMatch>);

impl CandidateSource for PrecomputedCandidates {
    fn source_name(&self) -> &str {
        "precomputed"
    }

    fn candidates(
        &self,
        _text: &str,
        _language: Option<&str>,
        entities: Option<&[String]>,
    ) -> Result<Vec<CandidateMatch>, PiiSiftError> {
        Ok(self
            .0
            .iter()
            .filter(|c| {
                let entity = canonical_entity_type(&c.entity_type);
                entities.map_or(true, |wanted| {
                    wanted.iter().any(|e| canonical_entity_type(e) == entity)
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precomputed_candidates_honour_entity_filter() {
        let source = PrecomputedCandidates(vec![
            CandidateMatch {
                entity_type: "PERSON".to_string(),
                start: 0,
                end: 3,
                text: "Ann".to_string(),
                score: 0.9,
                recognizer_id: "ner".to_string(),
            },
            CandidateMatch {
                entity_type: "EMAIL_ADDRESS".to_string(),
                start: 4,
                end: 9,
                text: "a@b.c".to_string(),
                score: 0.9,
                recognizer_id: "ner".to_string(),
            },
        ]);
        let wanted = vec!["PERSON".to_string()];
        let out = source.candidates("Ann a@b.c", None, Some(&wanted)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(source.candidates("", None, None).unwrap().len(), 2);
    }
}
