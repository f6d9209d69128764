#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/resmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod frame;
pub use frame::{date_values, float_values, symbol_columns};

mod returns;
pub use returns::{compound_prices, compute_returns};

mod summary;
pub use summary::{PriceSummary, summarize_prices};

mod fit;
pub use fit::{FactorModelFitter, FitConfig, FittedModel, N_REGRESSORS};

mod residuals;
pub use residuals::{DEFAULT_WINDOW, ResidualComputer, ResidualConfig};

mod scoring;
pub use scoring::MomentumScorer;

mod portfolio;
pub use portfolio::{PortfolioBuilder, PortfolioConfig};

mod pipeline;
pub use pipeline::{PipelineConfig, PipelineOutput, ResidualMomentumPipeline};

mod outcome;
pub use outcome::{BatchOutcome, Stage, TickerFailure};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use resmom_primitives::{MomentumScores, Portfolio, ResidualTable, Symbol};

    pub use super::{
        FactorModelFitter, ModelError, MomentumScorer, PipelineConfig, PortfolioBuilder,
        ResidualComputer, ResidualMomentumPipeline, compute_returns,
    };
}
