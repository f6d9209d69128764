//! Trailing idiosyncratic residuals.

use std::collections::BTreeMap;

use ndarray::Array1;
use polars::prelude::DataFrame;
use resmom_primitives::{ResidualTable, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{BatchOutcome, FittedModel, ModelError, frame::AlignedPanel};

/// Default residual window in periods (twelve months).
pub const DEFAULT_WINDOW: usize = 12;

/// Configuration for residual computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualConfig {
    /// Number of most recent aligned periods in the window.
    pub window: usize,
    /// Whether the fitted alpha is subtracted along with the factor terms.
    ///
    /// Off by default: the residual keeps the intercept, so a persistent
    /// alpha counts toward momentum.
    pub subtract_alpha: bool,
}

impl Default for ResidualConfig {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW, subtract_alpha: false }
    }
}

/// Computes `actual - sum(beta * factor)` over the trailing window.
#[derive(Debug, Clone, Default)]
pub struct ResidualComputer {
    config: ResidualConfig,
}

impl ResidualComputer {
    /// Create a new computer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResidualConfig::default())
    }

    /// Create a new computer with custom configuration.
    #[must_use]
    pub fn with_config(config: ResidualConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ResidualConfig {
        &self.config
    }

    /// Compute residuals for every fitted model.
    ///
    /// Returns and factors are aligned on exact dates and restricted to the
    /// most recent `window` aligned periods. Tickers with a missing return
    /// inside the window fail individually.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for a zero window,
    /// `ModelError::Alignment` when no dates overlap and
    /// `ModelError::InsufficientHistory` when fewer than `window` periods align.
    pub fn compute(
        &self,
        returns: &DataFrame,
        factors: &DataFrame,
        models: &BTreeMap<Symbol, FittedModel>,
    ) -> Result<BatchOutcome<ResidualTable>, ModelError> {
        let window = self.config.window;
        if window == 0 {
            return Err(ModelError::InvalidConfig("residual window must be positive".to_string()));
        }

        let panel = AlignedPanel::new(returns, factors)?;
        if panel.len() < window {
            return Err(ModelError::InsufficientHistory { required: window, actual: panel.len() });
        }
        let recent = panel.tail(window)?;

        let mut columns = Vec::with_capacity(models.len());
        let mut failures = BTreeMap::new();

        for (symbol, model) in models {
            match self.residual_column(&recent, symbol, model) {
                Ok(residuals) => columns.push((symbol.clone(), residuals)),
                Err(err) => {
                    warn!(%symbol, error = %err, "residual computation failed");
                    failures.insert(symbol.clone(), err);
                }
            }
        }

        let table = ResidualTable::from_columns(recent.dates().to_vec(), columns);
        info!(
            window,
            tickers = table.n_symbols(),
            failed = failures.len(),
            subtract_alpha = self.config.subtract_alpha,
            "computed residuals"
        );
        Ok(BatchOutcome::new(table, failures))
    }

    fn residual_column(
        &self,
        recent: &AlignedPanel,
        symbol: &Symbol,
        model: &FittedModel,
    ) -> Result<Array1<f64>, ModelError> {
        let observations = recent.observations(symbol)?;
        if observations.len() < recent.len() {
            return Err(ModelError::InsufficientData {
                symbol: symbol.to_string(),
                required: recent.len(),
                actual: observations.len(),
            });
        }

        let loadings = &model.loadings;
        let intercept = if self.config.subtract_alpha { loadings.alpha } else { 0.0 };

        Ok(observations
            .iter()
            .map(|o| o.ret - loadings.systematic_return(o.market, o.size, o.value) - intercept)
            .collect())
    }
}
