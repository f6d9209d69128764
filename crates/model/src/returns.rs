//! Price to return conversion.

use std::collections::BTreeMap;

use polars::prelude::*;
use resmom_primitives::{DATE_COLUMN, Symbol};
use tracing::debug;

use crate::{
    ModelError,
    frame::{require_column, symbol_columns},
};

/// Convert a price table into simple period-over-period returns.
///
/// Input layout is `| date | <ticker>... |` with one adjusted close per
/// ticker and date. Rows are sorted by date and each ticker column becomes
/// `(p_t - p_{t-1}) / p_{t-1}`. The first row is null for every ticker and a
/// missing price on either side of a pair yields a null return; nothing is
/// filled. Ticker columns are renamed to their normalized symbol.
///
/// # Errors
/// Returns `ModelError::MissingColumn` if there is no `date` column and
/// `ModelError::InvalidData` if two ticker columns normalize to the same
/// symbol (e.g. `aapl` and `AAPL`).
pub fn compute_returns(prices: &DataFrame) -> Result<DataFrame, ModelError> {
    require_column(prices, DATE_COLUMN)?;

    let symbols = symbol_columns(prices);
    let names: Vec<String> = prices
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_COLUMN)
        .map(|name| name.to_string())
        .collect();

    let mut seen: BTreeMap<&Symbol, &str> = BTreeMap::new();
    for (name, symbol) in names.iter().zip(&symbols) {
        if let Some(first) = seen.insert(symbol, name.as_str()) {
            return Err(ModelError::InvalidData(format!(
                "price columns '{first}' and '{name}' both normalize to {symbol}"
            )));
        }
    }

    let mut exprs = Vec::with_capacity(names.len() + 1);
    exprs.push(col(DATE_COLUMN));
    for (name, symbol) in names.iter().zip(&symbols) {
        let price = col(name.as_str()).cast(DataType::Float64);
        let previous = price.clone().shift(lit(1));
        exprs.push(((price - previous.clone()) / previous).alias(symbol.as_str()));
    }

    let returns = prices
        .clone()
        .lazy()
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .select(exprs)
        .collect()?;

    debug!(periods = returns.height(), tickers = symbols.len(), "computed returns");
    Ok(returns)
}

/// Rebuild a price path from an initial price and subsequent returns.
///
/// `price_t = price_{t-1} * (1 + r_t)`. The output has one more element than
/// `returns`, starting with `initial`.
#[must_use]
pub fn compound_prices(initial: f64, returns: &[f64]) -> Vec<f64> {
    let mut prices = Vec::with_capacity(returns.len() + 1);
    prices.push(initial);
    let mut last = initial;
    for r in returns {
        last *= 1.0 + r;
        prices.push(last);
    }
    prices
}
