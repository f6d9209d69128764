//! Per-ticker failure isolation.

use std::{collections::BTreeMap, fmt};

use resmom_primitives::Symbol;

use crate::ModelError;

/// Result of a batch stage: the successful output plus ticker-level failures.
///
/// A ticker that fails never appears in `value`.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Output built from the tickers that succeeded.
    pub value: T,
    /// Failure reason for each ticker that did not.
    pub failures: BTreeMap<Symbol, ModelError>,
}

impl<T> BatchOutcome<T> {
    /// Create a new outcome.
    #[must_use]
    pub const fn new(value: T, failures: BTreeMap<Symbol, ModelError>) -> Self {
        Self { value, failures }
    }

    /// Whether every ticker succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Split into the value and the failures.
    #[must_use]
    pub fn into_parts(self) -> (T, BTreeMap<Symbol, ModelError>) {
        (self.value, self.failures)
    }
}

/// Pipeline stage where a ticker failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Factor model fitting.
    Fit,
    /// Residual computation.
    Residuals,
    /// Momentum scoring.
    Score,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit => write!(f, "fit"),
            Self::Residuals => write!(f, "residuals"),
            Self::Score => write!(f, "score"),
        }
    }
}

/// A ticker excluded from the portfolio and why.
#[derive(Debug)]
pub struct TickerFailure {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Stage that failed.
    pub stage: Stage,
    /// Failure reason.
    pub error: ModelError,
}

impl fmt::Display for TickerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.symbol, self.stage, self.error)
    }
}

/// Tag a stage's failures with the stage name.
pub(crate) fn tag_failures(
    failures: BTreeMap<Symbol, ModelError>,
    stage: Stage,
) -> impl Iterator<Item = TickerFailure> {
    failures.into_iter().map(move |(symbol, error)| TickerFailure { symbol, stage, error })
}
