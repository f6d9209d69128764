//! resmom CLI binary.
//!
//! Builds a residual momentum long/short portfolio from monthly prices and
//! Fama-French three-factor returns.
//!
//! Usage:
//! - `resmom run --symbols AAPL,MSFT,GOOGL`
//! - `resmom run --factors F-F_Research_Data_Factors.CSV --prices prices.csv --format json`
//! - `resmom fetch --symbols AAPL,MSFT,GOOGL --output prices.csv`
//! - `resmom fetch --factors-output F-F_Research_Data_Factors.CSV`

mod report;

use std::{fs, path::PathBuf, process, time::Duration};

use anyhow::{Context, Result, bail};
use chrono::{Months, NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use resmom::{
    data::{
        FamaFrenchProvider, YahooPriceProvider, load_fama_french, load_prices_csv, month_start,
        write_fama_french_csv, write_prices_csv,
    },
    model::{PipelineConfig, ResidualMomentumPipeline, summarize_prices},
    primitives::Symbol,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default history when fetching from Yahoo Finance.
const DEFAULT_YEARS: u32 = 3;

#[derive(Parser)]
#[command(name = "resmom")]
#[command(about = "Residual momentum long/short portfolios", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `info`, `debug`, `resmom_model=debug`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print the portfolio
    Run(RunArgs),

    /// Download monthly adjusted closes and/or Fama-French factors to CSV files
    Fetch(FetchArgs),
}

#[derive(Args)]
struct DateRange {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Explicit bounds, or the last three years up to today.
    fn resolve(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_months(Months::new(12 * DEFAULT_YEARS))
                .context("start date out of range")?,
        };
        if start > end {
            bail!("start {start} is after end {end}");
        }
        Ok((start, end))
    }
}

#[derive(Args)]
struct RunArgs {
    /// Fama-French factor file (F-F_Research_Data_Factors.CSV); downloaded
    /// from the Kenneth French data library when omitted
    #[arg(short, long)]
    factors: Option<PathBuf>,

    /// Price file with a date column and one column per ticker
    #[arg(short, long, conflicts_with = "delay_ms")]
    prices: Option<PathBuf>,

    /// Ticker symbols; fetched from Yahoo Finance unless --prices is given
    #[arg(short, long, value_delimiter = ',')]
    symbols: Vec<String>,

    #[command(flatten)]
    range: DateRange,

    /// Pipeline configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Percent of the ranking to buy
    #[arg(long)]
    top_pct: Option<f64>,

    /// Percent of the ranking to sell
    #[arg(long)]
    bottom_pct: Option<f64>,

    /// Residual window in months
    #[arg(long)]
    window: Option<usize>,

    /// Subtract the fitted alpha from residuals
    #[arg(long)]
    subtract_alpha: bool,

    /// Minimum observations per regression
    #[arg(long)]
    min_observations: Option<usize>,

    /// Delay between Yahoo Finance requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl RunArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Unable to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid configuration in {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if let Some(top_pct) = self.top_pct {
            config.portfolio.top_pct = top_pct;
        }
        if let Some(bottom_pct) = self.bottom_pct {
            config.portfolio.bottom_pct = bottom_pct;
        }
        if let Some(window) = self.window {
            config.residuals.window = window;
        }
        if self.subtract_alpha {
            config.residuals.subtract_alpha = true;
        }
        if let Some(min_observations) = self.min_observations {
            config.fit.min_observations = min_observations;
        }
        Ok(config)
    }
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("targets").required(true).multiple(true).args(["output", "factors_output"])
))]
struct FetchArgs {
    /// Ticker symbols
    #[arg(short, long, value_delimiter = ',', requires = "output")]
    symbols: Vec<String>,

    #[command(flatten)]
    range: DateRange,

    /// Price CSV file to write
    #[arg(short, long, requires = "symbols")]
    output: Option<PathBuf>,

    /// Fama-French factor CSV file to write, in the library's layout
    #[arg(long)]
    factors_output: Option<PathBuf>,

    /// Delay between requests in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Fetch(args) => fetch_data(args).await,
    }
}

fn parse_symbols(raw: &[String]) -> Vec<Symbol> {
    raw.iter().map(Symbol::new).filter(|s| !s.as_str().is_empty()).collect()
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    let config = args.pipeline_config()?;
    config.validate()?;
    let symbols = parse_symbols(&args.symbols);

    let (prices, factor_range) = match &args.prices {
        Some(path) => {
            let prices = load_prices_csv(path)
                .with_context(|| format!("Unable to load prices from {}", path.display()))?;
            (prices, (args.range.start.map(month_start), args.range.end))
        }
        None => {
            if symbols.is_empty() {
                bail!("either --prices or --symbols is required");
            }
            let (start, end) = args.range.resolve()?;
            let delay = Duration::from_millis(args.delay_ms.unwrap_or(1000));
            let provider = YahooPriceProvider::with_rate_limit(delay)?;
            let prices = provider.fetch_monthly(&symbols, start, end).await?;
            (prices, (Some(month_start(start)), Some(end)))
        }
    };

    let factors = match &args.factors {
        Some(path) => load_fama_french(path, factor_range.0, factor_range.1)
            .with_context(|| format!("Unable to load factors from {}", path.display()))?,
        None => FamaFrenchProvider::new()?
            .fetch_frame(factor_range.0, factor_range.1)
            .await
            .context("Unable to download Fama-French factors")?,
    };

    // a symbol list only narrows the universe of a price file
    let selected = (args.prices.is_some() && !symbols.is_empty()).then_some(symbols.as_slice());

    let output = ResidualMomentumPipeline::with_config(config.clone())
        .run(&prices, &factors, selected)
        .context("Residual momentum pipeline failed")?;

    let mut price_history = summarize_prices(&prices)?;
    price_history.retain(|p| selected.is_none_or(|s| s.contains(&p.symbol)));
    match args.format {
        OutputFormat::Text => {
            print!("{}", report::render_text(&output, &config, &price_history));
        }
        OutputFormat::Json => {
            let json = report::JsonReport::new(&output, &price_history);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

async fn fetch_data(args: FetchArgs) -> Result<()> {
    if let Some(path) = &args.output {
        let symbols = parse_symbols(&args.symbols);
        if symbols.is_empty() {
            bail!("no valid symbols given");
        }
        let (start, end) = args.range.resolve()?;

        let provider = YahooPriceProvider::with_rate_limit(Duration::from_millis(args.delay_ms))?;
        let prices = provider.fetch_monthly(&symbols, start, end).await?;
        write_prices_csv(&prices, path)
            .with_context(|| format!("Unable to write {}", path.display()))?;

        info!(
            path = %path.display(),
            months = prices.height(),
            tickers = prices.width().saturating_sub(1),
            "wrote price table"
        );
    }

    if let Some(path) = &args.factors_output {
        let observations = FamaFrenchProvider::new()?
            .fetch()
            .await
            .context("Unable to download Fama-French factors")?;
        write_fama_french_csv(&observations, path)
            .with_context(|| format!("Unable to write {}", path.display()))?;
        info!(path = %path.display(), months = observations.len(), "wrote factor file");
    }
    Ok(())
}
