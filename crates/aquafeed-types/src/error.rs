// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Fuzzy Feed Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all AquaFeed kernel failures.
///
/// Construction-time variants (`InvalidMembershipParams`, `InvalidUniverse`,
/// `UnknownTerm`, `Config`) are fatal for the object being built. The
/// per-observation variants never escape a batch: the controller turns
/// them into gap records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Wrong number of control points, non-finite or non-monotonic points.
    #[error("invalid membership parameters for '{term}': {reason}")]
    InvalidMembershipParams { term: String, reason: String },

    /// Universe grid cannot be generated from the given range.
    #[error("invalid universe: {0}")]
    InvalidUniverse(String),

    /// Feed bounds are non-finite or inverted.
    #[error("invalid feed bounds: min={min}, max={max}")]
    InvalidBounds { min: f64, max: f64 },

    /// A rule references a term its linguistic variable does not define.
    #[error("unknown term '{term}' in variable '{variable}'")]
    UnknownTerm { variable: String, term: String },

    /// Observation lacks a temperature or pH reading.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Inference failed unexpectedly for a single observation.
    #[error("computation failure: {0}")]
    Computation(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    pub fn membership(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMembershipParams {
            term: term.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_term(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self::UnknownTerm {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_display() {
        let err = FeedError::membership("netral", "expected 3 or 4 control points, got 2");
        assert_eq!(
            err.to_string(),
            "invalid membership parameters for 'netral': expected 3 or 4 control points, got 2"
        );
    }

    #[test]
    fn test_unknown_term_display() {
        let err = FeedError::unknown_term("ph", "sangat_asam");
        assert!(err.to_string().contains("sangat_asam"));
        assert!(err.to_string().contains("ph"));
    }

    #[test]
    fn test_bounds_display() {
        let err = FeedError::InvalidBounds { min: 5.0, max: 1.0 };
        assert_eq!(err.to_string(), "invalid feed bounds: min=5, max=1");
    }
}
