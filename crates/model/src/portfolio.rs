//! Percentile-bucket long/short portfolio construction.

use resmom_math::percentile;
use resmom_primitives::{MomentumScores, Portfolio};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ModelError;

/// Configuration for the portfolio builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Share of the ranking bought, in percent. Exclusive range (0, 100).
    pub top_pct: f64,
    /// Share of the ranking sold, in percent. Exclusive range (0, 100).
    pub bottom_pct: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self { top_pct: 10.0, bottom_pct: 10.0 }
    }
}

impl PortfolioConfig {
    /// Check the percentages.
    ///
    /// Both must lie strictly between 0 and 100 and their sum must not exceed
    /// 100, which keeps the buy and sell buckets disjoint.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` describing the first violated bound.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, pct) in [("top_pct", self.top_pct), ("bottom_pct", self.bottom_pct)] {
            if !(pct > 0.0 && pct < 100.0) {
                return Err(ModelError::InvalidConfig(format!(
                    "{name} must be in (0, 100), got {pct}"
                )));
            }
        }
        if self.top_pct + self.bottom_pct > 100.0 {
            return Err(ModelError::InvalidConfig(format!(
                "top_pct + bottom_pct must not exceed 100, got {}",
                self.top_pct + self.bottom_pct
            )));
        }
        Ok(())
    }
}

/// Buckets ranked scores into buy and sell sets.
///
/// `buy` holds symbols scoring strictly above the `100 - top_pct` percentile
/// and `sell` those strictly below the `bottom_pct` percentile.
#[derive(Debug, Clone, Default)]
pub struct PortfolioBuilder {
    config: PortfolioConfig,
}

impl PortfolioBuilder {
    /// Create a new builder with the default 10% buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PortfolioConfig::default())
    }

    /// Create a new builder with custom configuration.
    #[must_use]
    pub const fn with_config(config: PortfolioConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Build the portfolio from ranked scores.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the percentages are out of range.
    pub fn build(&self, scores: &MomentumScores) -> Result<Portfolio, ModelError> {
        self.config.validate()?;
        if scores.is_empty() {
            return Ok(Portfolio::empty());
        }

        let values = scores.values();
        let upper_threshold = percentile(values.view(), 100.0 - self.config.top_pct)?;
        let lower_threshold = percentile(values.view(), self.config.bottom_pct)?;

        let buy = scores
            .iter()
            .filter(|s| s.score > upper_threshold)
            .map(|s| s.symbol.clone())
            .collect();
        let sell = scores
            .iter()
            .filter(|s| s.score < lower_threshold)
            .map(|s| s.symbol.clone())
            .collect();

        let portfolio = Portfolio { buy, sell, upper_threshold, lower_threshold };
        info!(
            buy = portfolio.buy.len(),
            sell = portfolio.sell.len(),
            upper_threshold,
            lower_threshold,
            "portfolio built"
        );
        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use resmom_primitives::Symbol;
    use rstest::rstest;

    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> MomentumScores {
        MomentumScores::ranked(pairs.iter().map(|(s, v)| (Symbol::new(*s), *v)))
    }

    #[test]
    fn three_stock_buckets() {
        let builder =
            PortfolioBuilder::with_config(PortfolioConfig { top_pct: 34.0, bottom_pct: 34.0 });
        let portfolio = builder.build(&scores(&[("A", -2.0), ("B", 0.5), ("C", 3.0)])).unwrap();

        assert_relative_eq!(portfolio.upper_threshold, 1.3, epsilon = 1e-12);
        assert_relative_eq!(portfolio.lower_threshold, -0.3, epsilon = 1e-12);
        assert_eq!(portfolio.buy, [Symbol::new("C")].into_iter().collect());
        assert_eq!(portfolio.sell, [Symbol::new("A")].into_iter().collect());
    }

    #[test]
    fn default_buckets_on_ten_names() {
        let pairs: Vec<(String, f64)> = (0..10).map(|i| (format!("S{i}"), i as f64)).collect();
        let scores =
            MomentumScores::ranked(pairs.iter().map(|(s, v)| (Symbol::new(s.as_str()), *v)));

        let portfolio = PortfolioBuilder::new().build(&scores).unwrap();
        // 90th percentile is 8.1 and the 10th is 0.9
        assert_eq!(portfolio.buy, [Symbol::new("S9")].into_iter().collect());
        assert_eq!(portfolio.sell, [Symbol::new("S0")].into_iter().collect());
    }

    #[test]
    fn ties_at_threshold_are_excluded() {
        let builder =
            PortfolioBuilder::with_config(PortfolioConfig { top_pct: 50.0, bottom_pct: 50.0 });
        let portfolio = builder.build(&scores(&[("A", 1.0), ("B", 1.0), ("C", 1.0)])).unwrap();
        assert_eq!(portfolio.n_positions(), 0);
    }

    #[test]
    fn single_score_has_no_positions() {
        let portfolio = PortfolioBuilder::new().build(&scores(&[("A", 0.7)])).unwrap();
        assert_eq!(portfolio.n_positions(), 0);
        assert_eq!(portfolio.upper_threshold, 0.7);
    }

    #[test]
    fn empty_scores_give_empty_portfolio() {
        let portfolio = PortfolioBuilder::new().build(&MomentumScores::default()).unwrap();
        assert_eq!(portfolio.n_positions(), 0);
    }

    #[rstest]
    #[case(10.0, 10.0)]
    #[case(25.0, 40.0)]
    #[case(50.0, 50.0)]
    #[case(1.0, 99.0)]
    fn buckets_are_disjoint(#[case] top_pct: f64, #[case] bottom_pct: f64) {
        let mut rng = StdRng::seed_from_u64(7);
        let pairs: Vec<(String, f64)> =
            (0..40).map(|i| (format!("T{i:02}"), rng.gen_range(-5.0..5.0))).collect();
        let scores =
            MomentumScores::ranked(pairs.iter().map(|(s, v)| (Symbol::new(s.as_str()), *v)));

        let portfolio = PortfolioBuilder::with_config(PortfolioConfig { top_pct, bottom_pct })
            .build(&scores)
            .unwrap();
        assert!(portfolio.buy.is_disjoint(&portfolio.sell));
        for symbol in &portfolio.buy {
            assert!(scores.get(symbol.as_str()).unwrap() > portfolio.upper_threshold);
        }
        for symbol in &portfolio.sell {
            assert!(scores.get(symbol.as_str()).unwrap() < portfolio.lower_threshold);
        }
    }

    #[rstest]
    #[case(0.0, 10.0)]
    #[case(10.0, 100.0)]
    #[case(-5.0, 10.0)]
    #[case(60.0, 50.0)]
    #[case(f64::NAN, 10.0)]
    fn invalid_percentages_rejected(#[case] top_pct: f64, #[case] bottom_pct: f64) {
        let builder = PortfolioBuilder::with_config(PortfolioConfig { top_pct, bottom_pct });
        let err = builder.build(&scores(&[("A", 1.0), ("B", 2.0)])).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }
}
