//! Risk-adjusted residual momentum scores.

use std::collections::BTreeMap;

use resmom_math::{is_effectively_constant, mean, sample_variance};
use resmom_primitives::{MomentumScores, ResidualTable, Symbol};
use tracing::{debug, info, warn};

use crate::{BatchOutcome, ModelError};

/// Minimum residuals per ticker for a sample variance.
const MIN_RESIDUALS: usize = 2;

/// Scores each ticker as `mean(residuals) / sample_variance(residuals)`.
///
/// The variance uses the `n - 1` denominator. The result is ranked in
/// ascending order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumScorer;

impl MomentumScorer {
    /// Create a new scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Score every column of the residual table.
    ///
    /// A ticker whose residuals are constant gets
    /// `ModelError::DegenerateScore` instead of an infinite score and is left
    /// out of the ranking.
    #[must_use]
    pub fn score(&self, residuals: &ResidualTable) -> BatchOutcome<MomentumScores> {
        let mut scores = Vec::with_capacity(residuals.n_symbols());
        let mut failures = BTreeMap::new();

        for (symbol, column) in residuals.columns() {
            match score_column(symbol, column) {
                Ok(score) => {
                    debug!(%symbol, score, "scored residual momentum");
                    scores.push((symbol.clone(), score));
                }
                Err(err) => {
                    warn!(%symbol, error = %err, "momentum score rejected");
                    failures.insert(symbol.clone(), err);
                }
            }
        }

        let ranked = MomentumScores::ranked(scores);
        info!(scored = ranked.len(), failed = failures.len(), "momentum scores ranked");
        BatchOutcome::new(ranked, failures)
    }
}

fn score_column(symbol: &Symbol, column: ndarray::ArrayView1<'_, f64>) -> Result<f64, ModelError> {
    if column.len() < MIN_RESIDUALS {
        return Err(ModelError::InsufficientData {
            symbol: symbol.to_string(),
            required: MIN_RESIDUALS,
            actual: column.len(),
        });
    }
    if is_effectively_constant(column) {
        return Err(ModelError::DegenerateScore { symbol: symbol.to_string() });
    }

    let score = mean(column)? / sample_variance(column)?;
    if !score.is_finite() {
        return Err(ModelError::DegenerateScore { symbol: symbol.to_string() });
    }
    Ok(score)
}
