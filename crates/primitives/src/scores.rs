//! Ranked momentum scores.

use std::cmp::Ordering;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A symbol and its risk-adjusted momentum score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSymbol {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Score value.
    pub score: f64,
}

/// Momentum scores ranked in ascending order.
///
/// Ties are broken by symbol so the ranking is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumScores {
    ranked: Vec<ScoredSymbol>,
}

impl MomentumScores {
    /// Rank raw `(symbol, score)` pairs in ascending score order.
    #[must_use]
    pub fn ranked(scores: impl IntoIterator<Item = (Symbol, f64)>) -> Self {
        let mut ranked: Vec<ScoredSymbol> =
            scores.into_iter().map(|(symbol, score)| ScoredSymbol { symbol, score }).collect();
        ranked.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Self { ranked }
    }

    /// Number of scored symbols.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Score for a specific symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.ranked.iter().find(|s| s.symbol.as_str() == symbol).map(|s| s.score)
    }

    /// Iterate in ascending score order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredSymbol> {
        self.ranked.iter()
    }

    /// Score values in ascending order.
    #[must_use]
    pub fn values(&self) -> Array1<f64> {
        self.ranked.iter().map(|s| s.score).collect()
    }
}

impl<'a> IntoIterator for &'a MomentumScores {
    type Item = &'a ScoredSymbol;
    type IntoIter = std::slice::Iter<'a, ScoredSymbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
