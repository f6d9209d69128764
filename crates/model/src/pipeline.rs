//! End-to-end residual momentum pipeline.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use resmom_primitives::{MomentumScores, Portfolio, ResidualTable, Symbol};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    FactorModelFitter, FitConfig, FittedModel, ModelError, MomentumScorer, PortfolioBuilder,
    PortfolioConfig, ResidualComputer, ResidualConfig, Stage, TickerFailure, compute_returns,
    outcome::tag_failures, symbol_columns,
};

/// Configuration for every pipeline stage.
///
/// Missing sections fall back to their defaults when deserialized, so a
/// partial JSON document such as `{"portfolio": {"top_pct": 20.0}}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Factor model fitting.
    pub fit: FitConfig,
    /// Residual window.
    pub residuals: ResidualConfig,
    /// Buy/sell bucket sizes.
    pub portfolio: PortfolioConfig,
}

impl PipelineConfig {
    /// Check the configuration before any data is processed.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for a zero residual window or
    /// out-of-range bucket percentages.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.residuals.window == 0 {
            return Err(ModelError::InvalidConfig("residual window must be positive".to_string()));
        }
        self.portfolio.validate()
    }
}

/// Everything produced by one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Period returns `| date | <ticker>... |`.
    pub returns: DataFrame,
    /// Fitted model per ticker.
    pub models: BTreeMap<Symbol, FittedModel>,
    /// Trailing residuals of the tickers that were scored.
    pub residuals: ResidualTable,
    /// Scores ranked in ascending order.
    pub scores: MomentumScores,
    /// Buy and sell buckets.
    pub portfolio: Portfolio,
    /// Tickers dropped along the way, in stage order.
    pub failures: Vec<TickerFailure>,
}

impl PipelineOutput {
    /// Failures recorded at a given stage.
    pub fn failures_at(&self, stage: Stage) -> impl Iterator<Item = &TickerFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    /// Whether a ticker was dropped at any stage.
    #[must_use]
    pub fn is_failed(&self, symbol: &str) -> bool {
        self.failures.iter().any(|f| f.symbol.as_str() == symbol)
    }
}

/// Runs returns, fitting, residuals, scoring and bucketing in order.
#[derive(Debug, Clone, Default)]
pub struct ResidualMomentumPipeline {
    config: PipelineConfig,
}

impl ResidualMomentumPipeline {
    /// Create a pipeline with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration.
    #[must_use]
    pub const fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline.
    ///
    /// # Arguments
    /// * `prices` - Adjusted closes `| date | <ticker>... |`
    /// * `factors` - Factor returns `| date | mkt_rf | smb | hml |` in decimals
    /// * `symbols` - Tickers to process; every price column when `None`
    ///
    /// # Errors
    /// Returns batch-level errors only: invalid configuration, missing date or
    /// factor columns, no overlapping dates or a history shorter than the
    /// residual window. Per-ticker problems end up in `PipelineOutput::failures`.
    pub fn run(
        &self,
        prices: &DataFrame,
        factors: &DataFrame,
        symbols: Option<&[Symbol]>,
    ) -> Result<PipelineOutput, ModelError> {
        self.config.validate()?;

        let returns = compute_returns(prices)?;
        let symbols = symbols.map_or_else(|| symbol_columns(&returns), <[Symbol]>::to_vec);
        info!(tickers = symbols.len(), periods = returns.height(), "running residual momentum");

        let (models, fit_failures) = FactorModelFitter::with_config(self.config.fit.clone())
            .fit(&returns, factors, &symbols)?
            .into_parts();

        let (residuals, residual_failures) =
            ResidualComputer::with_config(self.config.residuals.clone())
                .compute(&returns, factors, &models)?
                .into_parts();

        let (scores, score_failures) = MomentumScorer::new().score(&residuals).into_parts();

        let portfolio = PortfolioBuilder::with_config(self.config.portfolio).build(&scores)?;

        let failures: Vec<TickerFailure> = tag_failures(fit_failures, Stage::Fit)
            .chain(tag_failures(residual_failures, Stage::Residuals))
            .chain(tag_failures(score_failures, Stage::Score))
            .collect();

        info!(
            fitted = models.len(),
            scored = scores.len(),
            failed = failures.len(),
            buy = portfolio.buy.len(),
            sell = portfolio.sell.len(),
            "pipeline complete"
        );

        Ok(PipelineOutput { returns, models, residuals, scores, portfolio, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"portfolio": {"top_pct": 20.0}}"#).unwrap();
        assert_eq!(config.portfolio.top_pct, 20.0);
        assert_eq!(config.portfolio.bottom_pct, 10.0);
        assert_eq!(config.residuals, ResidualConfig::default());
        assert_eq!(config.fit, FitConfig::default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = PipelineConfig::default();
        config.residuals.subtract_alpha = true;
        config.fit.min_observations = 24;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_config_rejected_before_processing() {
        let mut config = PipelineConfig::default();
        config.portfolio.bottom_pct = 0.0;

        let empty = DataFrame::empty();
        let pipeline = ResidualMomentumPipeline::with_config(config);
        let err = pipeline.run(&empty, &empty, None).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }
}
