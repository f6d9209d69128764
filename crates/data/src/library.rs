//! Downloads from the Kenneth French data library.

use std::{
    io::{Cursor, Read},
    time::Duration,
};

use polars::prelude::DataFrame;
use resmom_primitives::Date;
use tracing::{debug, info};

use crate::{
    DataError, Result,
    famafrench::{FactorObservation, factor_frame, parse_fama_french},
};

/// Zipped `F-F_Research_Data_Factors.CSV` on the library's FTP mirror.
pub const FAMA_FRENCH_URL: &str = concat!(
    "https://mba.tuck.dartmouth.edu/pages/faculty/ken.french/ftp/",
    "F-F_Research_Data_Factors_CSV.zip"
);

const USER_AGENT: &str = concat!("resmom/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fama-French three-factor downloader.
#[derive(Debug, Clone)]
pub struct FamaFrenchProvider {
    client: reqwest::Client,
    url: String,
}

impl FamaFrenchProvider {
    /// Create a provider for the library's research factors archive.
    ///
    /// # Errors
    /// Returns `DataError::Network` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_url(FAMA_FRENCH_URL)
    }

    /// Create a provider that downloads the archive from `url`.
    ///
    /// # Errors
    /// Returns `DataError::Network` if the HTTP client cannot be built.
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DataError::Network)?;
        Ok(Self { client, url: url.into() })
    }

    /// Archive URL this provider downloads.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse every monthly observation.
    ///
    /// # Errors
    /// Returns `DataError::Network` on request failure or a non-success
    /// status, `DataError::Archive` for a corrupt archive and the errors of
    /// [`parse_fama_french_zip`].
    pub async fn fetch(&self) -> Result<Vec<FactorObservation>> {
        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!(url = %self.url, bytes = bytes.len(), "downloaded factor archive");

        let observations = parse_fama_french_zip(&bytes)?;
        info!(months = observations.len(), "fetched Fama-French factors");
        Ok(observations)
    }

    /// Download the factors as a `| date | mkt_rf | smb | hml |` table.
    ///
    /// # Errors
    /// See [`Self::fetch`] and [`factor_frame`].
    pub async fn fetch_frame(&self, start: Option<Date>, end: Option<Date>) -> Result<DataFrame> {
        let observations = self.fetch().await?;
        factor_frame(&observations, start, end)
    }
}

/// Parse the factor CSV packed inside a library zip archive.
///
/// The first `.csv` entry (case-insensitive) is read.
///
/// # Errors
/// Returns `DataError::Archive` for an unreadable archive,
/// `DataError::MissingData` if it holds no CSV file and the errors of
/// [`parse_fama_french`].
pub fn parse_fama_french_zip(bytes: &[u8]) -> Result<Vec<FactorObservation>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        debug!(entry = entry.name(), bytes = contents.len(), "extracted factor file");
        return parse_fama_french(contents.as_slice());
    }

    Err(DataError::MissingData {
        symbol: "Fama-French".to_string(),
        reason: "archive contains no CSV file".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_relative_eq;
    use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

    use super::*;

    const FACTORS: &str = "\
This file was created by CMPT_ME_BEME_RETS using the 202401 CRSP database.

,Mkt-RF,SMB,HML,RF
202311,    8.83,   -0.02,    1.66,    0.44
202312,    4.87,    6.34,    4.93,    0.43

 Annual Factors: January-December
,Mkt-RF,SMB,HML,RF
2023,   21.69,   -3.55,   -4.12,    5.01
";

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn parses_csv_inside_archive() {
        let bytes = archive(&[("F-F_Research_Data_Factors.CSV", FACTORS)]);
        let rows = parse_fama_french_zip(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, Date::from_ymd_opt(2023, 11, 1).unwrap());
        assert_relative_eq!(rows[0].mkt_rf.unwrap(), 0.0883, epsilon = 1e-12);
        assert_relative_eq!(rows[1].hml.unwrap(), 0.0493, epsilon = 1e-12);
    }

    #[test]
    fn skips_non_csv_entries() {
        let bytes = archive(&[("README.txt", "not factors"), ("factors.csv", FACTORS)]);
        assert_eq!(parse_fama_french_zip(&bytes).unwrap().len(), 2);
    }

    #[test]
    fn archive_without_csv() {
        let bytes = archive(&[("README.txt", "not factors")]);
        assert!(matches!(parse_fama_french_zip(&bytes), Err(DataError::MissingData { .. })));
    }

    #[test]
    fn corrupt_archive() {
        assert!(matches!(parse_fama_french_zip(b"not a zip"), Err(DataError::Archive(_))));
    }

    #[test]
    fn provider_keeps_url() {
        let provider = FamaFrenchProvider::with_url("http://localhost/factors.zip").unwrap();
        assert_eq!(provider.url(), "http://localhost/factors.zip");
        assert_eq!(FamaFrenchProvider::new().unwrap().url(), FAMA_FRENCH_URL);
    }
}
