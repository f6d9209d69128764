//! Fama-French factor definitions and fitted loadings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three Fama-French risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FamaFrenchFactor {
    /// Market excess return (Mkt-RF).
    MarketExcess,
    /// Small minus big (SMB).
    Size,
    /// High minus low book-to-market (HML).
    Value,
}

impl FamaFrenchFactor {
    /// All factors in regression order.
    pub const ALL: [Self; 3] = [Self::MarketExcess, Self::Size, Self::Value];

    /// Column name used for this factor in factor tables.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::MarketExcess => "mkt_rf",
            Self::Size => "smb",
            Self::Value => "hml",
        }
    }

    /// Header used for this factor in the Kenneth French data library files.
    #[must_use]
    pub const fn library_label(self) -> &'static str {
        match self {
            Self::MarketExcess => "Mkt-RF",
            Self::Size => "SMB",
            Self::Value => "HML",
        }
    }
}

impl fmt::Display for FamaFrenchFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.library_label())
    }
}

/// Factor loadings for a single stock from the three-factor regression.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorLoadings {
    /// Regression intercept.
    pub alpha: f64,
    /// Beta to the market excess return.
    pub market: f64,
    /// Beta to the size factor.
    pub size: f64,
    /// Beta to the value factor.
    pub value: f64,
}

impl FactorLoadings {
    /// Create new factor loadings.
    #[must_use]
    pub const fn new(alpha: f64, market: f64, size: f64, value: f64) -> Self {
        Self { alpha, market, size, value }
    }

    /// Beta for a specific factor.
    #[must_use]
    pub const fn beta(&self, factor: FamaFrenchFactor) -> f64 {
        match factor {
            FamaFrenchFactor::MarketExcess => self.market,
            FamaFrenchFactor::Size => self.size,
            FamaFrenchFactor::Value => self.value,
        }
    }

    /// Factor-explained return for one period, excluding alpha.
    #[must_use]
    pub const fn systematic_return(&self, market: f64, size: f64, value: f64) -> f64 {
        self.market * market + self.size * size + self.value * value
    }
}
