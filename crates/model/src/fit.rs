//! Per-stock Fama-French three-factor regressions.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use resmom_math::ordinary_least_squares;
use resmom_primitives::{Date, FactorLoadings, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    BatchOutcome, ModelError,
    frame::{AlignedPanel, Observation},
};

/// Number of regressors: intercept plus three factors.
pub const N_REGRESSORS: usize = 4;

/// Configuration for the factor model fitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Minimum complete observations required per stock.
    ///
    /// Values below the number of regressors are raised to it.
    pub min_observations: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self { min_observations: N_REGRESSORS }
    }
}

/// A fitted three-factor model for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// Estimated intercept and betas.
    pub loadings: FactorLoadings,
    /// Standard errors of the estimates (absent without residual degrees of freedom).
    pub std_errors: Option<FactorLoadings>,
    /// R-squared.
    pub r_squared: f64,
    /// Adjusted R-squared (absent without residual degrees of freedom).
    pub adj_r_squared: Option<f64>,
    /// Number of observations used.
    pub n_obs: usize,
    /// First date used in the fit.
    pub start: Date,
    /// Last date used in the fit.
    pub end: Date,
}

/// Fits `r = alpha + b_m * MktRF + b_s * SMB + b_v * HML` by OLS for each stock.
///
/// Each stock is fitted on its own complete rows only; there is no pooling
/// across stocks.
#[derive(Debug, Clone, Default)]
pub struct FactorModelFitter {
    config: FitConfig,
}

impl FactorModelFitter {
    /// Create a new fitter with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FitConfig::default())
    }

    /// Create a new fitter with custom configuration.
    #[must_use]
    pub fn with_config(config: FitConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FitConfig {
        &self.config
    }

    const fn min_observations(&self) -> usize {
        if self.config.min_observations > N_REGRESSORS {
            self.config.min_observations
        } else {
            N_REGRESSORS
        }
    }

    /// Fit a model for every symbol.
    ///
    /// # Arguments
    /// * `returns` - Return table `| date | <ticker>... |`
    /// * `factors` - Factor table `| date | mkt_rf | smb | hml |`
    /// * `symbols` - Tickers to model
    ///
    /// # Errors
    /// Returns `ModelError::Alignment` if returns and factors share no dates
    /// and `ModelError::MissingColumn` if a factor column is absent.
    /// Ticker-level failures are reported in the outcome instead.
    pub fn fit(
        &self,
        returns: &DataFrame,
        factors: &DataFrame,
        symbols: &[Symbol],
    ) -> Result<BatchOutcome<BTreeMap<Symbol, FittedModel>>, ModelError> {
        let panel = AlignedPanel::new(returns, factors)?;

        let mut models = BTreeMap::new();
        let mut failures = BTreeMap::new();

        for symbol in symbols {
            let fitted =
                panel.observations(symbol).and_then(|obs| self.fit_observations(symbol, &obs));
            match fitted {
                Ok(model) => {
                    debug!(
                        %symbol,
                        alpha = model.loadings.alpha,
                        beta_market = model.loadings.market,
                        r_squared = model.r_squared,
                        n_obs = model.n_obs,
                        "fitted factor model"
                    );
                    models.insert(symbol.clone(), model);
                }
                Err(err) => {
                    warn!(%symbol, error = %err, "factor model fit failed");
                    failures.insert(symbol.clone(), err);
                }
            }
        }

        info!(fitted = models.len(), failed = failures.len(), "factor models fitted");
        Ok(BatchOutcome::new(models, failures))
    }

    fn fit_observations(
        &self,
        symbol: &Symbol,
        observations: &[Observation],
    ) -> Result<FittedModel, ModelError> {
        let n = observations.len();
        let required = self.min_observations();
        if n < required {
            return Err(ModelError::InsufficientData {
                symbol: symbol.to_string(),
                required,
                actual: n,
            });
        }

        let y: Array1<f64> = observations.iter().map(|o| o.ret).collect();
        let mut x = Array2::zeros((n, N_REGRESSORS));
        for (i, o) in observations.iter().enumerate() {
            x[[i, 0]] = 1.0;
            x[[i, 1]] = o.market;
            x[[i, 2]] = o.size;
            x[[i, 3]] = o.value;
        }

        let result = ordinary_least_squares(&y, &x)
            .map_err(|source| ModelError::FitFailed { symbol: symbol.to_string(), source })?;

        let c = &result.coefficients;
        let loadings = FactorLoadings::new(c[0], c[1], c[2], c[3]);
        let std_errors =
            result.std_errors.as_ref().map(|se| FactorLoadings::new(se[0], se[1], se[2], se[3]));

        Ok(FittedModel {
            loadings,
            std_errors,
            r_squared: result.r_squared,
            adj_r_squared: result.adj_r_squared,
            n_obs: n,
            start: observations[0].date,
            end: observations[n - 1].date,
        })
    }
}
