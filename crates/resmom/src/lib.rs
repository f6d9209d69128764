//! # resmom
//!
//! Residual momentum long/short portfolios.
//!
//! Stocks are ranked by the risk-adjusted mean of their Fama-French
//! three-factor residuals over the last twelve months. The top decile is
//! bought and the bottom decile sold.
//!
//! This crate provides a unified interface to the resmom crates. Individual
//! components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `math`: Regression, statistics and percentiles
//! - `model`: Returns, factor fits, residuals, scores and portfolio buckets
//! - `data`: Yahoo Finance prices, CSV price files and Fama-French factors
//! - `cli`: The `resmom` command-line tool
//!
//! ## Example
//!
//! ```rust,ignore
//! use resmom::{data, model::ResidualMomentumPipeline};
//!
//! let prices = data::load_prices_csv("prices.csv")?;
//! let factors = data::load_fama_french("F-F_Research_Data_Factors.CSV", None, None)?;
//! let output = ResidualMomentumPipeline::new().run(&prices, &factors, None)?;
//! println!("buy: {:?}", output.portfolio.buy);
//! println!("sell: {:?}", output.portfolio.sell);
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use resmom_primitives as primitives;
#[cfg(feature = "math")]
#[doc(inline)]
pub use resmom_math as math;
#[cfg(feature = "model")]
#[doc(inline)]
pub use resmom_model as model;
#[cfg(feature = "data")]
#[doc(inline)]
pub use resmom_data as data;
