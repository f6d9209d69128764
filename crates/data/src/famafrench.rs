//! Fama-French three-factor data from the Kenneth French data library.
//!
//! The library publishes `F-F_Research_Data_Factors.CSV` with a free-text
//! preamble, a monthly section keyed by `YYYYMM` and an annual section keyed
//! by `YYYY`. Values are percentages.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{Read, Write},
    path::Path,
};

use polars::prelude::*;
use resmom_primitives::{DATE_COLUMN, Date, FamaFrenchFactor};
use tracing::{debug, info};

use crate::{
    DataError, Result,
    month::{check_range, parse_yyyymm},
};

/// Label of the risk-free rate column.
const RISK_FREE_LABEL: &str = "RF";

/// Values the library uses for missing observations.
const MISSING_SENTINELS: [f64; 2] = [-99.99, -999.0];

/// One month of factor returns, in decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorObservation {
    /// First day of the month.
    pub date: Date,
    /// Market excess return.
    pub mkt_rf: Option<f64>,
    /// Small minus big.
    pub smb: Option<f64>,
    /// High minus low.
    pub hml: Option<f64>,
    /// Risk-free rate.
    pub rf: Option<f64>,
}

impl FactorObservation {
    /// Value of one of the three factors.
    #[must_use]
    pub const fn factor(&self, factor: FamaFrenchFactor) -> Option<f64> {
        match factor {
            FamaFrenchFactor::MarketExcess => self.mkt_rf,
            FamaFrenchFactor::Size => self.smb,
            FamaFrenchFactor::Value => self.hml,
        }
    }
}

/// Column positions taken from the header row.
#[derive(Debug, Clone, Copy)]
struct Layout {
    mkt_rf: usize,
    smb: usize,
    hml: usize,
    rf: Option<usize>,
}

impl Default for Layout {
    fn default() -> Self {
        Self { mkt_rf: 1, smb: 2, hml: 3, rf: Some(4) }
    }
}

impl Layout {
    fn from_header(record: &csv::StringRecord) -> Option<Self> {
        let position = |label: &str| record.iter().position(|f| f.eq_ignore_ascii_case(label));
        Some(Self {
            mkt_rf: position(FamaFrenchFactor::MarketExcess.library_label())?,
            smb: position(FamaFrenchFactor::Size.library_label())?,
            hml: position(FamaFrenchFactor::Value.library_label())?,
            rf: position(RISK_FREE_LABEL),
        })
    }
}

/// Parse the monthly section of a Fama-French factor file.
///
/// Preamble lines and the annual section are skipped. Rows are returned in
/// ascending date order; a month listed twice keeps its last row.
///
/// # Errors
/// Returns `DataError::Parse` for an unreadable value in a monthly row or a
/// file with no monthly rows.
pub fn parse_fama_french<R: Read>(reader: R) -> Result<Vec<FactorObservation>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut layout = Layout::default();
    let mut rows = BTreeMap::new();

    for record in csv.records() {
        let record = record?;
        let key = record.get(0).unwrap_or_default();

        if key.is_empty() {
            if let Some(header) = Layout::from_header(&record) {
                layout = header;
            }
            continue;
        }
        let Some(date) = parse_yyyymm(key) else {
            continue;
        };

        let value = |index: usize| parse_percent(&record, index, key);
        rows.insert(
            date,
            FactorObservation {
                date,
                mkt_rf: value(layout.mkt_rf)?,
                smb: value(layout.smb)?,
                hml: value(layout.hml)?,
                rf: layout.rf.map(value).transpose()?.flatten(),
            },
        );
    }

    if rows.is_empty() {
        return Err(DataError::Parse("no monthly Fama-French rows found".to_string()));
    }
    debug!(months = rows.len(), "parsed Fama-French factors");
    Ok(rows.into_values().collect())
}

fn parse_percent(record: &csv::StringRecord, index: usize, key: &str) -> Result<Option<f64>> {
    let cell = record
        .get(index)
        .ok_or_else(|| DataError::Parse(format!("row {key}: missing column {index}")))?;
    let pct: f64 =
        cell.parse().map_err(|_| DataError::Parse(format!("row {key}: invalid value '{cell}'")))?;
    if !pct.is_finite() || MISSING_SENTINELS.contains(&pct) {
        return Ok(None);
    }
    Ok(Some(pct / 100.0))
}

/// Build a `| date | mkt_rf | smb | hml |` factor table.
///
/// The risk-free rate is dropped. `start` and `end` bound the months kept,
/// inclusive; they are compared against month starts.
///
/// # Errors
/// Returns `DataError::InvalidDateRange` if `start` is after `end` and
/// `DataError::MissingData` if no month falls inside the range.
pub fn factor_frame(
    observations: &[FactorObservation],
    start: Option<Date>,
    end: Option<Date>,
) -> Result<DataFrame> {
    if let (Some(start), Some(end)) = (start, end) {
        check_range(start, end)?;
    }

    let kept: Vec<&FactorObservation> = observations
        .iter()
        .filter(|o| start.is_none_or(|s| o.date >= s) && end.is_none_or(|e| o.date <= e))
        .collect();
    if kept.is_empty() {
        return Err(DataError::MissingData {
            symbol: "Fama-French".to_string(),
            reason: "no factor months inside the requested range".to_string(),
        });
    }

    let mut columns = Vec::with_capacity(FamaFrenchFactor::ALL.len() + 1);
    columns.push(Column::new(DATE_COLUMN.into(), kept.iter().map(|o| o.date).collect::<Vec<_>>()));
    for factor in FamaFrenchFactor::ALL {
        let values: Vec<Option<f64>> = kept.iter().map(|o| o.factor(factor)).collect();
        columns.push(Column::new(factor.column_name().into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Load the factor table from a library CSV file.
///
/// # Errors
/// See [`parse_fama_french`] and [`factor_frame`]; also fails if the file
/// cannot be opened.
pub fn load_fama_french(
    path: impl AsRef<Path>,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<DataFrame> {
    let path = path.as_ref();
    let observations = parse_fama_french(File::open(path)?)?;
    let frame = factor_frame(&observations, start, end)?;
    info!(path = %path.display(), months = frame.height(), "loaded Fama-French factors");
    Ok(frame)
}

/// Write observations in the library's monthly layout.
///
/// Values are written back as percentages and missing values as the
/// `-99.99` sentinel, so [`parse_fama_french`] reads the output back.
///
/// # Errors
/// Returns `DataError::Csv` or `DataError::Io` if writing fails.
pub fn write_fama_french<W: Write>(observations: &[FactorObservation], writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new().quote_style(csv::QuoteStyle::Never).from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(FamaFrenchFactor::ALL.iter().map(|f| f.library_label().to_string()));
    header.push(RISK_FREE_LABEL.to_string());
    csv.write_record(&header)?;

    for o in observations {
        let mut record = vec![o.date.format("%Y%m").to_string()];
        record.extend(FamaFrenchFactor::ALL.iter().map(|&f| format_percent(o.factor(f))));
        record.push(format_percent(o.rf));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write observations to a library-format CSV file.
///
/// # Errors
/// See [`write_fama_french`]; also fails if the file cannot be created.
pub fn write_fama_french_csv(
    observations: &[FactorObservation],
    path: impl AsRef<Path>,
) -> Result<()> {
    write_fama_french(observations, File::create(path)?)
}

fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING_SENTINELS[0].to_string(), |v| (v * 100.0).to_string())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const SAMPLE: &str = "\
This file was created by CMPT_ME_BEME_RETS using the 202401 CRSP database.
The 1-month TBill return is from Ibbotson and Associates Inc.

,Mkt-RF,SMB,HML,RF
192607,    2.96,   -2.56,   -2.43,    0.22
192608,    2.64,   -1.17,    3.82,    0.25
192609,    0.36,   -1.40,    0.13,    0.23

 Annual Factors: January-December
,Mkt-RF,SMB,HML,RF
1927,   29.47,   -2.04,   -4.54,    3.12

Copyright 2024 Kenneth R. French
";

    fn month(y: i32, m: u32) -> Date {
        Date::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn parses_monthly_section_only() {
        let rows = parse_fama_french(SAMPLE.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, month(1926, 7));
        assert_relative_eq!(rows[0].mkt_rf.unwrap(), 0.0296, epsilon = 1e-12);
        assert_relative_eq!(rows[0].smb.unwrap(), -0.0256, epsilon = 1e-12);
        assert_relative_eq!(rows[0].hml.unwrap(), -0.0243, epsilon = 1e-12);
        assert_relative_eq!(rows[0].rf.unwrap(), 0.0022, epsilon = 1e-12);
        assert_eq!(rows[2].date, month(1926, 9));
    }

    #[test]
    fn header_order_is_respected() {
        let text = ",HML,Mkt-RF,SMB\n202301,1.0,2.0,3.0\n";
        let rows = parse_fama_french(text.as_bytes()).unwrap();
        assert_relative_eq!(rows[0].hml.unwrap(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(rows[0].mkt_rf.unwrap(), 0.02, epsilon = 1e-12);
        assert_relative_eq!(rows[0].smb.unwrap(), 0.03, epsilon = 1e-12);
        assert_eq!(rows[0].rf, None);
    }

    #[test]
    fn sentinels_become_missing() {
        let text = ",Mkt-RF,SMB,HML,RF\n202301,-99.99,1.0,2.0,0.1\n";
        let rows = parse_fama_french(text.as_bytes()).unwrap();
        assert_eq!(rows[0].mkt_rf, None);
        assert!(rows[0].smb.is_some());
    }

    #[test]
    fn no_monthly_rows_is_error() {
        let text = "Annual only\n,Mkt-RF,SMB,HML,RF\n1927,1,2,3,4\n";
        assert!(matches!(parse_fama_french(text.as_bytes()), Err(DataError::Parse(_))));
    }

    #[test]
    fn bad_value_is_error() {
        let text = ",Mkt-RF,SMB,HML,RF\n202301,x,1.0,2.0,0.1\n";
        assert!(matches!(parse_fama_french(text.as_bytes()), Err(DataError::Parse(_))));
    }

    #[test]
    fn frame_drops_risk_free_and_filters_range() {
        let rows = parse_fama_french(SAMPLE.as_bytes()).unwrap();
        let df = factor_frame(&rows, Some(month(1926, 8)), None).unwrap();

        assert_eq!(df.get_column_names(), vec!["date", "mkt_rf", "smb", "hml"]);
        assert_eq!(df.height(), 2);
        let hml: Vec<Option<f64>> = df.column("hml").unwrap().f64().unwrap().into_iter().collect();
        assert_relative_eq!(hml[0].unwrap(), 0.0382, epsilon = 1e-12);
    }

    #[test]
    fn written_file_parses_back() {
        let mut rows = parse_fama_french(SAMPLE.as_bytes()).unwrap();
        rows[1].smb = None;

        let mut buf = Vec::new();
        write_fama_french(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(",Mkt-RF,SMB,HML,RF"));
        let second = text.lines().nth(2).unwrap();
        assert!(second.starts_with("192608,") && second.contains("-99.99"));

        let back = parse_fama_french(text.as_bytes()).unwrap();
        assert_eq!(back.len(), rows.len());
        assert_eq!(back[1].smb, None);
        for (a, b) in back.iter().zip(&rows) {
            assert_eq!(a.date, b.date);
            assert_relative_eq!(a.mkt_rf.unwrap(), b.mkt_rf.unwrap(), epsilon = 1e-12);
            assert_relative_eq!(a.hml.unwrap(), b.hml.unwrap(), epsilon = 1e-12);
            assert_relative_eq!(a.rf.unwrap(), b.rf.unwrap(), epsilon = 1e-12);
        }
    }

    #[test]
    fn frame_range_errors() {
        let rows = parse_fama_french(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(
            factor_frame(&rows, Some(month(1927, 1)), Some(month(1926, 1))),
            Err(DataError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            factor_frame(&rows, Some(month(2000, 1)), None),
            Err(DataError::MissingData { .. })
        ));
    }
}
