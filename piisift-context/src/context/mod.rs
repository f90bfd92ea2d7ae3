// piisift-context/src/context/mod.rs
use daachorse::DoubleArrayAhoCorasick;
extern crate alloc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Default number of bytes inspected on each side of a candidate span.
pub const DEFAULT_CONTEXT_WINDOW: usize = 64;

/// Error raised when the keyword automaton cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBuildError(pub String);

impl fmt::Display for ContextBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build context automaton: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ContextBuildError {}

/// Scans for recognizer context keywords surrounding a candidate span with
/// word-boundary awareness. Matching is ASCII case-insensitive.
pub struct ContextScanner {
    automaton: Option<DoubleArrayAhoCorasick<usize>>,
    keyword_count: usize,
}

impl fmt::Debug for ContextScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScanner")
         .field("automaton", &"<DoubleArrayAhoCorasick>")
         .field("keyword_count", &self.keyword_count)
         .finish()
    }
}

impl ContextScanner {
    /// Builds a scanner from a keyword list. Blank and duplicate keywords are dropped;
    /// an empty list yields a scanner that never reports context.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, ContextBuildError> {
        let mut patterns: Vec<String> = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let kw = kw.as_ref().trim().to_ascii_lowercase();
            if !kw.is_empty() && !patterns.contains(&kw) {
                patterns.push(kw);
            }
        }

        if patterns.is_empty() {
            return Ok(Self { automaton: None, keyword_count: 0 });
        }

        let keyword_count = patterns.len();
        let automaton = DoubleArrayAhoCorasick::new(patterns)
            .map_err(|e| ContextBuildError(e.to_string()))?;

        Ok(Self { automaton: Some(automaton), keyword_count })
    }

    /// Number of distinct keywords compiled into the automaton.
    pub fn keyword_count(&self) -> usize {
        self.keyword_count
    }

    /// Returns true if any keyword appears within `window_size` bytes before
    /// `span_start` or after `span_end`.
    pub fn has_context(&self, text: &[u8], span_start: usize, span_end: usize, window_size: usize) -> bool {
        self.scan_preceding_context(text, span_start, window_size)
            || self.scan_following_context(text, span_end, window_size)
    }

    /// Scans the preceding context for keywords.
    /// Employs word-boundary checks to ensure "nip" doesn't match "turnip".
    pub fn scan_preceding_context(&self, text: &[u8], span_start: usize, window_size: usize) -> bool {
        if span_start == 0 || span_start > text.len() { return false; }
        let start = span_start.saturating_sub(window_size);
        self.scan_window(&text[start..span_start])
    }

    /// Scans the context that follows a span.
    pub fn scan_following_context(&self, text: &[u8], span_end: usize, window_size: usize) -> bool {
        if span_end >= text.len() { return false; }
        let end = span_end.saturating_add(window_size).min(text.len());
        self.scan_window(&text[span_end..end])
    }

    fn scan_window(&self, window: &[u8]) -> bool {
        let Some(automaton) = &self.automaton else { return false; };
        let lowered = window.to_ascii_lowercase();

        for matched in automaton.find_overlapping_iter(&lowered) {
            let m_start = matched.start();
            let m_end = matched.end();

            // Word boundary check: keyword must not be glued to alphanumeric chars
            let prefix_ok = m_start == 0 || !lowered[m_start - 1].is_ascii_alphanumeric();
            let suffix_ok = m_end == lowered.len() || !lowered[m_end].is_ascii_alphanumeric();

            if prefix_ok && suffix_ok {
                return true;
            }
        }
        false
    }
}
