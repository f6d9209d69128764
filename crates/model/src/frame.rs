//! Reading date-indexed polars frames and aligning returns with factors.

use chrono::DateTime;
use polars::prelude::*;
use resmom_primitives::{DATE_COLUMN, Date, FamaFrenchFactor, Symbol};

use crate::ModelError;

/// Ticker columns of a price or return frame (every column except `date`).
#[must_use]
pub fn symbol_columns(df: &DataFrame) -> Vec<Symbol> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_COLUMN)
        .map(|name| Symbol::new(name.as_str()))
        .collect()
}

/// Dates of a frame's `date` column.
///
/// # Errors
/// Returns `ModelError::MissingColumn` without a `date` column and
/// `ModelError::InvalidData` if a date is null.
pub fn date_values(df: &DataFrame) -> Result<Vec<Date>, ModelError> {
    let days = require_column(df, DATE_COLUMN)?.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|d| {
            d.and_then(date_from_epoch_days)
                .ok_or_else(|| ModelError::InvalidData("null or out-of-range date".to_string()))
        })
        .collect()
}

/// Values of a numeric column, with NaN and infinities mapped to missing.
///
/// # Errors
/// Returns `ModelError::MissingColumn` if the column does not exist.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ModelError> {
    let column = require_column(df, name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().map(|v| v.filter(|x| x.is_finite())).collect())
}

pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, ModelError> {
    df.column(name).map_err(|_| ModelError::MissingColumn(name.to_string()))
}

fn date_from_epoch_days(days: i32) -> Option<Date> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}

/// One aligned period with a stock return and all three factor returns present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Observation {
    pub(crate) date: Date,
    pub(crate) ret: f64,
    pub(crate) market: f64,
    pub(crate) size: f64,
    pub(crate) value: f64,
}

/// Return and factor series joined on exact date matches, sorted by date.
#[derive(Debug, Clone)]
pub(crate) struct AlignedPanel {
    frame: DataFrame,
    dates: Vec<Date>,
    market: Vec<Option<f64>>,
    size: Vec<Option<f64>>,
    value: Vec<Option<f64>>,
}

impl AlignedPanel {
    /// Inner-join returns with the three factor columns on `date`.
    pub(crate) fn new(returns: &DataFrame, factors: &DataFrame) -> Result<Self, ModelError> {
        require_column(returns, DATE_COLUMN)?;
        require_column(factors, DATE_COLUMN)?;
        for factor in FamaFrenchFactor::ALL {
            require_column(factors, factor.column_name())?;
        }

        let factor_exprs: Vec<Expr> = std::iter::once(col(DATE_COLUMN).cast(DataType::Date))
            .chain(
                FamaFrenchFactor::ALL
                    .iter()
                    .map(|f| col(f.column_name()).cast(DataType::Float64)),
            )
            .collect();

        let frame = returns
            .clone()
            .lazy()
            .with_column(col(DATE_COLUMN).cast(DataType::Date))
            .join(
                factors.clone().lazy().select(factor_exprs),
                [col(DATE_COLUMN)],
                [col(DATE_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([DATE_COLUMN], SortMultipleOptions::default())
            .collect()?;

        if frame.height() == 0 {
            return Err(ModelError::Alignment(
                "return and factor series share no dates".to_string(),
            ));
        }

        Self::from_frame(frame)
    }

    fn from_frame(frame: DataFrame) -> Result<Self, ModelError> {
        let dates = date_values(&frame)?;
        let market = float_values(&frame, FamaFrenchFactor::MarketExcess.column_name())?;
        let size = float_values(&frame, FamaFrenchFactor::Size.column_name())?;
        let value = float_values(&frame, FamaFrenchFactor::Value.column_name())?;
        Ok(Self { frame, dates, market, size, value })
    }

    /// Number of aligned periods.
    pub(crate) const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Aligned dates in ascending order.
    pub(crate) fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The most recent `n` aligned periods.
    pub(crate) fn tail(&self, n: usize) -> Result<Self, ModelError> {
        Self::from_frame(self.frame.tail(Some(n)))
    }

    /// Stock returns for a symbol, one entry per aligned period.
    pub(crate) fn returns(&self, symbol: &Symbol) -> Result<Vec<Option<f64>>, ModelError> {
        float_values(&self.frame, symbol.as_str())
    }

    /// Periods where the symbol's return and every factor are present.
    pub(crate) fn observations(&self, symbol: &Symbol) -> Result<Vec<Observation>, ModelError> {
        let returns = self.returns(symbol)?;
        Ok(returns
            .iter()
            .enumerate()
            .filter_map(|(i, ret)| {
                Some(Observation {
                    date: self.dates[i],
                    ret: (*ret)?,
                    market: self.market[i]?,
                    size: self.size[i]?,
                    value: self.value[i]?,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> Date {
        Date::from_ymd_opt(2023, m, 1).unwrap()
    }

    fn factors(months: &[u32]) -> DataFrame {
        let n = months.len();
        DataFrame::new(vec![
            Column::new("date".into(), months.iter().map(|&m| month(m)).collect::<Vec<_>>()),
            Column::new("mkt_rf".into(), vec![0.01; n]),
            Column::new("smb".into(), vec![0.002; n]),
            Column::new("hml".into(), vec![-0.003; n]),
        ])
        .unwrap()
    }

    #[test]
    fn date_values_round_trip() {
        let df = factors(&[1, 2, 3]);
        assert_eq!(date_values(&df).unwrap(), vec![month(1), month(2), month(3)]);
    }

    #[test]
    fn symbol_columns_skip_date() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec![month(1)]),
            Column::new("AAPL".into(), vec![1.0]),
            Column::new("msft".into(), vec![2.0]),
        ])
        .unwrap();
        assert_eq!(symbol_columns(&df), vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
    }

    #[test]
    fn float_values_treat_nan_as_missing() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec![month(1), month(2), month(3)]),
            Column::new("X".into(), vec![Some(1.0), Some(f64::NAN), None]),
        ])
        .unwrap();
        assert_eq!(float_values(&df, "X").unwrap(), vec![Some(1.0), None, None]);
        assert!(matches!(float_values(&df, "Y"), Err(ModelError::MissingColumn(_))));
    }

    #[test]
    fn panel_joins_on_common_dates() {
        let returns = DataFrame::new(vec![
            Column::new("date".into(), vec![month(3), month(1), month(2), month(4)]),
            Column::new("A".into(), vec![Some(0.3), None, Some(0.2), Some(0.4)]),
        ])
        .unwrap();

        let panel = AlignedPanel::new(&returns, &factors(&[1, 2, 3])).unwrap();
        assert_eq!(panel.dates(), &[month(1), month(2), month(3)]);

        let obs = panel.observations(&Symbol::new("A")).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].date, month(2));
        assert_eq!(obs[1].ret, 0.3);
        assert_eq!(obs[1].market, 0.01);
    }

    #[test]
    fn panel_without_overlap_is_alignment_error() {
        let returns = DataFrame::new(vec![
            Column::new("date".into(), vec![month(10), month(11)]),
            Column::new("A".into(), vec![0.1, 0.2]),
        ])
        .unwrap();

        let err = AlignedPanel::new(&returns, &factors(&[1, 2])).unwrap_err();
        assert!(matches!(err, ModelError::Alignment(_)));
    }

    #[test]
    fn panel_requires_factor_columns() {
        let returns = factors(&[1]);
        let incomplete = factors(&[1]).drop("hml").unwrap();
        let err = AlignedPanel::new(&returns, &incomplete).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(ref c) if c == "hml"));
    }

    #[test]
    fn panel_tail_keeps_latest_periods() {
        let returns = DataFrame::new(vec![
            Column::new("date".into(), vec![month(1), month(2), month(3)]),
            Column::new("A".into(), vec![0.1, 0.2, 0.3]),
        ])
        .unwrap();

        let panel = AlignedPanel::new(&returns, &factors(&[1, 2, 3])).unwrap();
        let tail = panel.tail(2).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.dates(), &[month(2), month(3)]);
    }
}
