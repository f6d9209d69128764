#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/resmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod linalg;
pub use linalg::{OlsResult, invert_matrix, ordinary_least_squares, solve_linear_system};

mod stats;
pub use stats::{is_effectively_constant, mean, percentile, sample_variance};

mod error;
pub use error::MathError;
