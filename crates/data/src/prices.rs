//! Wide price tables and their CSV form.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{Read, Write},
    path::Path,
};

use polars::prelude::*;
use resmom_primitives::{DATE_COLUMN, Date, Symbol};
use tracing::debug;

use crate::{DataError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Build a `| date | <ticker>... |` price table from per-symbol series.
///
/// Dates are the sorted union across all symbols; a symbol without a price
/// on some date gets a null there.
///
/// # Errors
/// Returns `DataError::Polars` if the frame cannot be assembled.
pub fn wide_price_frame(series: &BTreeMap<Symbol, BTreeMap<Date, f64>>) -> Result<DataFrame> {
    let dates: BTreeSet<Date> = series.values().flat_map(BTreeMap::keys).copied().collect();
    let dates: Vec<Date> = dates.into_iter().collect();

    let mut columns = Vec::with_capacity(series.len() + 1);
    columns.push(Column::new(DATE_COLUMN.into(), dates.clone()));
    for (symbol, prices) in series {
        let values: Vec<Option<f64>> = dates.iter().map(|d| prices.get(d).copied()).collect();
        columns.push(Column::new(symbol.as_str().into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Read a `date,<ticker>...` price table.
///
/// Dates are ISO `YYYY-MM-DD`. Empty cells and `NaN` become nulls.
///
/// # Errors
/// Returns `DataError::Parse` if the first column is not `date` or a cell
/// cannot be parsed, and `DataError::Csv` for malformed CSV.
pub fn read_prices<R: Read>(reader: R) -> Result<DataFrame> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv.headers()?.clone();
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case(DATE_COLUMN) => {}
        _ => {
            return Err(DataError::Parse(format!(
                "price file must start with a '{DATE_COLUMN}' column"
            )));
        }
    }
    let symbols: Vec<Symbol> = headers.iter().skip(1).map(Symbol::new).collect();

    let mut dates = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); symbols.len()];
    for (line, record) in csv.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = Date::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::Parse(format!("row {}: invalid date '{raw_date}': {e}", line + 1))
        })?;
        dates.push(date);

        for (j, column) in values.iter_mut().enumerate() {
            column.push(parse_price(record.get(j + 1).unwrap_or_default(), line + 1)?);
        }
    }

    let mut columns = Vec::with_capacity(symbols.len() + 1);
    columns.push(Column::new(DATE_COLUMN.into(), dates));
    for (symbol, column) in symbols.iter().zip(values) {
        columns.push(Column::new(symbol.as_str().into(), column));
    }

    let df = DataFrame::new(columns)?;
    debug!(rows = df.height(), tickers = symbols.len(), "read price table");
    Ok(df)
}

fn parse_price(cell: &str, line: usize) -> Result<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .map_err(|_| DataError::Parse(format!("row {line}: invalid price '{cell}'")))?;
    Ok(value.is_finite().then_some(value))
}

/// Write a price table as `date,<ticker>...` CSV with ISO dates.
///
/// Nulls are written as empty cells.
///
/// # Errors
/// Returns `DataError::Parse` without a `date` column and `DataError::Csv`
/// or `DataError::Io` if writing fails.
pub fn write_prices<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let date_column = df
        .column(DATE_COLUMN)
        .map_err(|_| DataError::Parse(format!("price table has no '{DATE_COLUMN}' column")))?;
    let dates = date_column.cast(&DataType::Date)?.cast(&DataType::String)?;
    let dates = dates.str()?;

    let names: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(PlSmallStr::as_str)
        .filter(|name| *name != DATE_COLUMN)
        .collect();
    let columns = names
        .iter()
        .map(|name| df.column(name)?.cast(&DataType::Float64))
        .collect::<PolarsResult<Vec<_>>>()?;
    let columns = columns.iter().map(Column::f64).collect::<PolarsResult<Vec<_>>>()?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(std::iter::once(DATE_COLUMN).chain(names.iter().copied()))?;
    for i in 0..df.height() {
        let mut record = Vec::with_capacity(names.len() + 1);
        record.push(dates.get(i).unwrap_or_default().to_string());
        for column in &columns {
            record.push(column.get(i).map(|v| v.to_string()).unwrap_or_default());
        }
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Load a price table from a CSV file.
///
/// # Errors
/// See [`read_prices`]; also fails if the file cannot be opened.
pub fn load_prices_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_prices(File::open(path)?)
}

/// Save a price table to a CSV file.
///
/// # Errors
/// See [`write_prices`]; also fails if the file cannot be created.
pub fn write_prices_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    write_prices(df, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn month(m: u32) -> Date {
        Date::from_ymd_opt(2023, m, 1).unwrap()
    }

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn wide_frame_unions_dates() {
        let mut series = BTreeMap::new();
        series.insert(Symbol::new("AAA"), BTreeMap::from([(month(1), 10.0), (month(2), 11.0)]));
        series.insert(Symbol::new("BBB"), BTreeMap::from([(month(2), 20.0), (month(3), 21.0)]));

        let df = wide_price_frame(&series).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(values(&df, "AAA"), vec![Some(10.0), Some(11.0), None]);
        assert_eq!(values(&df, "BBB"), vec![None, Some(20.0), Some(21.0)]);
    }

    #[test]
    fn read_price_csv() {
        let text = "date,aapl,MSFT\n2023-01-01,130.5,240\n2023-02-01,,250.25\n2023-03-01,NaN,260\n";
        let df = read_prices(text.as_bytes()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.get_column_names(), vec!["date", "AAPL", "MSFT"]);
        assert_eq!(values(&df, "AAPL"), vec![Some(130.5), None, None]);
        assert_relative_eq!(values(&df, "MSFT")[1].unwrap(), 250.25);
    }

    #[test]
    fn read_rejects_missing_date_header() {
        let text = "when,AAPL\n2023-01-01,1.0\n";
        assert!(matches!(read_prices(text.as_bytes()), Err(DataError::Parse(_))));
    }

    #[test]
    fn read_rejects_bad_cells() {
        let bad_date = "date,AAPL\n01/02/2023,1.0\n";
        assert!(matches!(read_prices(bad_date.as_bytes()), Err(DataError::Parse(_))));

        let bad_price = "date,AAPL\n2023-01-01,abc\n";
        assert!(matches!(read_prices(bad_price.as_bytes()), Err(DataError::Parse(_))));
    }

    #[test]
    fn written_csv_reads_back() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), vec![month(1), month(2)]),
            Column::new("AAA".into(), vec![Some(1.5), None]),
            Column::new("BBB".into(), vec![Some(2.0), Some(2.25)]),
        ])
        .unwrap();

        let mut buffer = Vec::new();
        write_prices(&df, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().next(), Some("date,AAA,BBB"));
        assert_eq!(text.lines().nth(1), Some("2023-01-01,1.5,2"));
        assert_eq!(text.lines().nth(2), Some("2023-02-01,,2.25"));

        let parsed = read_prices(text.as_bytes()).unwrap();
        assert_eq!(values(&parsed, "AAA"), values(&df, "AAA"));
        assert_eq!(values(&parsed, "BBB"), values(&df, "BBB"));
    }
}
