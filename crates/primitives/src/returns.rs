//! Residual return table.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{Date, Symbol};

/// Idiosyncratic residual returns over a trailing window.
///
/// Rows are dates in ascending order, columns are symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualTable {
    /// Window dates (n_dates,).
    pub dates: Vec<Date>,
    /// Symbols (n_symbols,).
    pub symbols: Vec<Symbol>,
    /// Residual matrix (n_dates x n_symbols).
    pub residuals: Array2<f64>,
}

impl ResidualTable {
    /// Create a new residual table.
    #[must_use]
    pub fn new(dates: Vec<Date>, symbols: Vec<Symbol>, residuals: Array2<f64>) -> Self {
        debug_assert_eq!(dates.len(), residuals.nrows());
        debug_assert_eq!(symbols.len(), residuals.ncols());
        Self { dates, symbols, residuals }
    }

    /// Build a table from per-symbol residual columns sharing the same dates.
    ///
    /// Every column must have one entry per date.
    #[must_use]
    pub fn from_columns(dates: Vec<Date>, columns: Vec<(Symbol, Array1<f64>)>) -> Self {
        let mut residuals = Array2::zeros((dates.len(), columns.len()));
        let mut symbols = Vec::with_capacity(columns.len());
        for (j, (symbol, values)) in columns.into_iter().enumerate() {
            debug_assert_eq!(values.len(), dates.len());
            residuals.column_mut(j).assign(&values);
            symbols.push(symbol);
        }
        Self { dates, symbols, residuals }
    }

    /// Number of dates in the window.
    #[must_use]
    pub const fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of symbols.
    #[must_use]
    pub const fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the table has no symbols.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Residual column for a symbol.
    #[must_use]
    pub fn column(&self, symbol: &str) -> Option<ArrayView1<'_, f64>> {
        self.symbols
            .iter()
            .position(|s| s.as_str() == symbol)
            .map(|j| self.residuals.index_axis(Axis(1), j))
    }

    /// Iterate over `(symbol, residual column)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&Symbol, ArrayView1<'_, f64>)> {
        self.symbols.iter().zip(self.residuals.axis_iter(Axis(1)))
    }
}
