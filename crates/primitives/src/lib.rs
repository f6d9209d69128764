#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/resmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod asset;
pub use asset::Symbol;

mod factor;
pub use factor::{FactorLoadings, FamaFrenchFactor};

mod returns;
pub use returns::ResidualTable;

mod scores;
pub use scores::{MomentumScores, ScoredSymbol};

mod portfolio;
pub use portfolio::Portfolio;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;

/// Name of the date column in price, return and factor tables.
pub const DATE_COLUMN: &str = "date";
