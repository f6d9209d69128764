//! Monthly adjusted closes from Yahoo Finance.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, NaiveTime};
use polars::prelude::DataFrame;
use resmom_primitives::{Date, Symbol};
use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use yahoo_finance_api as yahoo;

use crate::{
    DataError, Result,
    month::{check_range, month_start},
    prices::wide_price_frame,
};

/// Yahoo Finance bar interval for monthly history.
const MONTHLY_INTERVAL: &str = "1mo";

/// Yahoo Finance monthly price provider with rate limiting.
pub struct YahooPriceProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceProvider {
    /// Create a provider with the default delay of one second between requests.
    ///
    /// # Errors
    /// Returns `DataError::YahooApi` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a provider with a custom delay between requests.
    ///
    /// # Errors
    /// Returns `DataError::YahooApi` if the HTTP client cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self { provider: yahoo::YahooConnector::new()?, rate_limit_delay })
    }

    /// Fetch monthly adjusted closes for one symbol.
    ///
    /// Bars are keyed by the first day of their month; if Yahoo returns two
    /// bars in one month (a partial current month), the later one wins.
    ///
    /// # Errors
    /// Returns `DataError::InvalidSymbol` for an empty symbol,
    /// `DataError::InvalidDateRange` if `start` is after `end`,
    /// `DataError::YahooApi` on request failure and `DataError::MissingData`
    /// when no usable bar comes back.
    pub async fn fetch_symbol(
        &self,
        symbol: &Symbol,
        start: Date,
        end: Date,
    ) -> Result<BTreeMap<Date, f64>> {
        if symbol.as_str().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        check_range(start, end)?;

        let response = self
            .provider
            .get_quote_history_interval(
                symbol.as_str(),
                to_offset_date_time(start)?,
                to_offset_date_time(end)?,
                MONTHLY_INTERVAL,
            )
            .await?;
        let quotes = response.quotes().map_err(|e| DataError::YahooApi(e.to_string()))?;

        let closes = monthly_closes(quotes.iter().map(|q| (q.timestamp, q.adjclose)));
        if closes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }
        debug!(%symbol, months = closes.len(), "fetched monthly closes");
        Ok(closes)
    }

    /// Fetch a `| date | <ticker>... |` monthly price table.
    ///
    /// Symbols are requested one at a time with the configured delay in
    /// between. A symbol that fails is logged and left out.
    ///
    /// # Errors
    /// Returns `DataError::InvalidDateRange` if `start` is after `end` and
    /// `DataError::MissingData` if no symbol could be fetched.
    pub async fn fetch_monthly(
        &self,
        symbols: &[Symbol],
        start: Date,
        end: Date,
    ) -> Result<DataFrame> {
        check_range(start, end)?;

        let mut series = BTreeMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                sleep(self.rate_limit_delay).await;
            }
            match self.fetch_symbol(symbol, start, end).await {
                Ok(closes) => {
                    series.insert(symbol.clone(), closes);
                }
                Err(err) => warn!(%symbol, error = %err, "skipping symbol"),
            }
        }

        if series.is_empty() {
            return Err(DataError::MissingData {
                symbol: "batch".to_string(),
                reason: "No data fetched for any symbol".to_string(),
            });
        }

        let frame = wide_price_frame(&series)?;
        info!(
            requested = symbols.len(),
            fetched = series.len(),
            months = frame.height(),
            "fetched monthly prices"
        );
        Ok(frame)
    }
}

/// Key `(unix timestamp, adjusted close)` bars by month start.
///
/// Non-finite closes and unrepresentable timestamps are dropped.
fn monthly_closes(bars: impl IntoIterator<Item = (i64, f64)>) -> BTreeMap<Date, f64> {
    bars.into_iter()
        .filter(|(_, close)| close.is_finite())
        .filter_map(|(timestamp, close)| {
            DateTime::from_timestamp(timestamp, 0).map(|dt| (month_start(dt.date_naive()), close))
        })
        .collect()
}

fn to_offset_date_time(date: Date) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn timestamp(y: i32, m: u32, d: u32) -> i64 {
        date(y, m, d).and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    #[test]
    fn bars_keyed_by_month_start() {
        let closes = monthly_closes(vec![
            (timestamp(2024, 1, 1), 100.0),
            (timestamp(2024, 2, 1), 101.0),
            // partial current month
            (timestamp(2024, 2, 16), 102.5),
            (timestamp(2024, 3, 1), f64::NAN),
        ]);

        assert_eq!(closes.len(), 2);
        assert_eq!(closes[&date(2024, 1, 1)], 100.0);
        assert_eq!(closes[&date(2024, 2, 1)], 102.5);
    }

    #[test]
    fn offset_date_time_is_midnight_utc() {
        let odt = to_offset_date_time(date(2020, 1, 1)).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_577_836_800);
    }

    #[tokio::test]
    async fn reversed_range_rejected_before_request() {
        let provider = YahooPriceProvider::with_rate_limit(Duration::ZERO).unwrap();
        let result = provider
            .fetch_monthly(&[Symbol::new("AAPL")], date(2024, 1, 1), date(2023, 1, 1))
            .await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn empty_symbol_rejected() {
        let provider = YahooPriceProvider::with_rate_limit(Duration::ZERO).unwrap();
        let result =
            provider.fetch_symbol(&Symbol::new(""), date(2023, 1, 1), date(2024, 1, 1)).await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }
}
