// File: piisift-core/src/filters.rs
//! Text heuristics applied to candidates before scoring.
//!
//! The allow-list applies to every entity type. The remaining filters only
//! apply to name-like types (`PERSON` and the labels NER models use for it),
//! where generic recognition produces most of its false positives: pronouns,
//! single words, acronyms and sentence fragments around a real name.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Entity labels treated as person names.
pub const NAME_LIKE_TYPES: [&str; 3] = ["PERSON", "PER", "persName"];

/// Canonical label emitted for any name-like entity.
pub const PERSON: &str = "PERSON";

static PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves",
        "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
        "we", "us", "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves",
        // Polish
        "ja", "mnie", "mi", "mną", "ty", "ciebie", "cię", "tobie", "ci", "tobą", "on", "jego",
        "go", "niego", "jemu", "mu", "niemu", "nim", "ona", "jej", "niej", "ją", "nią", "ono",
        "my", "nas", "nam", "nami", "wy", "was", "wam", "wami", "oni", "one", "ich", "nich",
        "im", "nimi", "je", "siebie", "sobie", "sobą",
    ]
    .into_iter()
    .collect()
});

static HONORIFICS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "miss", "dr", "prof", "sir", "madam", "pan", "pani", "panna",
    ]
    .into_iter()
    .collect()
});

pub fn is_name_like(entity_type: &str) -> bool {
    NAME_LIKE_TYPES.contains(&entity_type)
}

/// Maps name-like labels onto [`PERSON`]; other types pass through.
pub fn canonical_entity_type(entity_type: &str) -> &str {
    if is_name_like(entity_type) {
        PERSON
    } else {
        entity_type
    }
}

/// Lowercased token with surrounding punctuation removed.
fn token_key(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Whitespace-delimited tokens with their byte offsets.
fn tokens(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &text[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out
}

/// A caller or mode supplied set of literals that are never PII.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        list.extend(entries);
        list
    }

    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries.extend(
            entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty()),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the whole text, or any of its tokens, is allow-listed.
    /// Matching is case-insensitive.
    pub fn matches(&self, text: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        if self.entries.contains(&text.trim().to_lowercase()) {
            return true;
        }
        tokens(text).into_iter().any(|(_, tok)| {
            self.entries.contains(&tok.to_lowercase()) || self.entries.contains(&token_key(tok))
        })
    }
}

/// True when the text is a pronoun or contains one as a token.
pub fn contains_pronoun(text: &str) -> bool {
    if PRONOUNS.contains(token_key(text).as_str()) {
        return true;
    }
    let toks = tokens(text);
    toks.iter()
        .enumerate()
        .any(|(i, &(_, tok))| PRONOUNS.contains(token_key(tok).as_str()) && !is_regnal_numeral(&toks, i))
}

/// A bare upper-case `I` between two capitalized words is a regnal numeral,
/// as in "Zygmunt I Stary", not the pronoun.
fn is_regnal_numeral(toks: &[(usize, &str)], i: usize) -> bool {
    toks[i].1 == "I"
        && i > 0
        && is_capitalized(toks[i - 1].1)
        && toks.get(i + 1).is_some_and(|&(_, next)| is_capitalized(next))
}

/// True for a recognised honorific, with or without a trailing period.
pub fn is_honorific(token: &str) -> bool {
    HONORIFICS.contains(token_key(token).as_str())
}

/// True when the word immediately before `start` in `text` is an honorific.
pub fn preceded_by_honorific(text: &str, start: usize) -> bool {
    text.get(..start)
        .and_then(|before| tokens(before).last().map(|&(_, tok)| is_honorific(tok)))
        .unwrap_or(false)
}

/// Structural check for names: more than one token, or an honorific in front.
pub fn has_name_structure(span: &str, text: &str, start: usize) -> bool {
    tokens(span).len() >= 2 || preceded_by_honorific(text, start)
}

/// Fully upper-case spans with more than one letter read as acronyms.
pub fn is_all_caps(span: &str) -> bool {
    let mut letters = 0usize;
    for c in span.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters > 1
}

fn is_capitalized(token: &str) -> bool {
    token
        .chars()
        .find(|c| c.is_alphabetic())
        .is_some_and(char::is_uppercase)
}

/// Narrows `span` to its longest contiguous run of capitalized tokens.
///
/// Honorifics count as part of a run whatever their case. Punctuation at the
/// outer edges of the run is dropped, except the period of a trailing honorific
/// or initial. Returns the byte range of the run relative to `span`, or `None`
/// when no token is capitalized.
///
/// Applying the function to its own output returns the full range: the run
/// already consists of capitalized tokens with clean edges.
pub fn capitalized_run(span: &str) -> Option<(usize, usize)> {
    let toks = tokens(span);
    let mut best: Option<(usize, usize)> = None;
    let mut current: Option<usize> = None;

    for (i, &(_, tok)) in toks.iter().enumerate() {
        if is_capitalized(tok) || is_honorific(tok) {
            let first = *current.get_or_insert(i);
            let longer = best.map_or(true, |(b0, b1)| i - first > b1 - b0);
            if longer {
                best = Some((first, i));
            }
        } else {
            current = None;
        }
    }

    let (first, last) = best?;
    let start = toks[first].0;
    let (last_off, last_tok) = toks[last];
    let mut end = last_off + last_tok.len();

    let lead = span[start..end]
        .char_indices()
        .find(|&(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)?;
    let start = start + lead;

    let core = token_key(last_tok);
    let keep_period = HONORIFICS.contains(core.as_str()) || core.chars().count() == 1;
    while let Some(c) = span[start..end].chars().next_back() {
        if c.is_alphanumeric() || (c == '.' && keep_period) {
            break;
        }
        end -= c.len_utf8();
    }

    Some((start, end))
}
