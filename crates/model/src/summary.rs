//! Per-ticker price history summary.

use polars::prelude::DataFrame;
use resmom_primitives::{DATE_COLUMN, Date, Symbol};
use serde::Serialize;

use crate::{ModelError, date_values, float_values};

/// First, last and extreme prices of one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Number of non-missing prices.
    pub n_obs: usize,
    /// Earliest date with a price, and that price.
    pub first: (Date, f64),
    /// Latest date with a price, and that price.
    pub last: (Date, f64),
    /// Lowest price.
    pub min: f64,
    /// Highest price.
    pub max: f64,
}

impl PriceSummary {
    /// Simple return from the first to the last price.
    #[must_use]
    pub fn total_return(&self) -> f64 {
        self.last.1 / self.first.1 - 1.0
    }
}

/// Summarize every ticker column of a `| date | <ticker>... |` price table.
///
/// Tickers without a single price are left out.
///
/// # Errors
/// Returns `ModelError::MissingColumn` without a `date` column and
/// `ModelError::InvalidData` for a null date.
pub fn summarize_prices(prices: &DataFrame) -> Result<Vec<PriceSummary>, ModelError> {
    let dates = date_values(prices)?;
    let mut summaries = Vec::new();

    for name in prices.get_column_names() {
        if name.as_str() == DATE_COLUMN {
            continue;
        }
        let mut points: Vec<(Date, f64)> = dates
            .iter()
            .zip(float_values(prices, name.as_str())?)
            .filter_map(|(&d, v)| v.map(|v| (d, v)))
            .collect();
        points.sort_by_key(|&(d, _)| d);

        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            continue;
        };
        let (min, max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, p)| (lo.min(p), hi.max(p)));
        summaries.push(PriceSummary {
            symbol: Symbol::new(name.as_str()),
            n_obs: points.len(),
            first,
            last,
            min,
            max,
        });
    }
    Ok(summaries)
}
