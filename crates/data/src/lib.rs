#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/resmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::{DataError, Result};

mod month;
pub use month::{check_range, month_start, parse_yyyymm};

mod prices;
pub use prices::{load_prices_csv, read_prices, wide_price_frame, write_prices, write_prices_csv};

mod famafrench;
pub use famafrench::{
    FactorObservation, factor_frame, load_fama_french, parse_fama_french, write_fama_french,
    write_fama_french_csv,
};

mod library;
pub use library::{FAMA_FRENCH_URL, FamaFrenchProvider, parse_fama_french_zip};

mod yahoo;
pub use yahoo::YahooPriceProvider;
