//! Error types raised while configuring suitability scoring.
#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors raised while validating scoring configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    /// A weight was negative or non-finite, or no weight was positive.
    #[error(
        "score weights must be finite, non-negative, and not all zero \
         (benefit {benefit}, impact {impact}, cost {cost})"
    )]
    InvalidWeights {
        /// Weight applied to the benefit column.
        benefit: f64,
        /// Weight applied to the impact-penalty column.
        impact: f64,
        /// Weight applied to the cost-penalty column.
        cost: f64,
    },
}
