// piisift-context/src/scoring/mod.rs

/// Parameters of the context score boost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextBoost {
    /// Added to the base score when a context keyword is present.
    pub factor: f64,
    /// Floor applied to a boosted score.
    pub min_score: f64,
}

impl Default for ContextBoost {
    fn default() -> Self {
        Self {
            factor: 0.35,
            min_score: 0.4,
        }
    }
}

/// Calculates the final score (0.0 - 1.0) of a candidate given whether
/// keyword context was found near it.
pub fn boost_score(base: f64, has_keyword_context: bool, boost: &ContextBoost) -> f64 {
    if !has_keyword_context {
        return base;
    }
    let boosted = (base + boost.factor).min(1.0);
    boosted.max(boost.min_score).min(1.0)
}
