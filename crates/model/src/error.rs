//! Error types for the residual momentum model.

use resmom_math::MathError;

/// Errors that can occur while fitting, scoring or building the portfolio.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A ticker lacks enough aligned, non-missing observations.
    #[error("insufficient data for {symbol}: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Ticker symbol.
        symbol: String,
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// The aligned history is shorter than the residual window.
    #[error("insufficient history: residual window needs {required} aligned periods, got {actual}")]
    InsufficientHistory {
        /// Window length.
        required: usize,
        /// Aligned periods available.
        actual: usize,
    },

    /// Residual variance is zero, so the momentum score is undefined.
    #[error("degenerate score for {symbol}: residual variance is zero")]
    DegenerateScore {
        /// Ticker symbol.
        symbol: String,
    },

    /// Regression failed for a ticker.
    #[error("model fit failed for {symbol}: {source}")]
    FitFailed {
        /// Ticker symbol.
        symbol: String,
        /// Underlying numerical error.
        #[source]
        source: MathError,
    },

    /// Return and factor series share no dates.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ModelError {
    /// Returns whether this error affects a single ticker only.
    ///
    /// Ticker-level errors are collected into a failure report while the
    /// rest of the batch proceeds.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. }
                | Self::DegenerateScore { .. }
                | Self::FitFailed { .. }
                | Self::MissingColumn(_)
        )
    }
}
