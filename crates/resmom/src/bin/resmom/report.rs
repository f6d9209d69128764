//! Text and JSON rendering of a pipeline run.

use std::{collections::BTreeMap, fmt::Write};

use resmom::{
    model::{FittedModel, PipelineConfig, PipelineOutput, PriceSummary},
    primitives::{Date, Portfolio, ScoredSymbol},
};
use serde::Serialize;

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Number of histogram bins.
const HISTOGRAM_BINS: usize = 20;

/// Widest histogram bar in characters.
const HISTOGRAM_WIDTH: usize = 40;

/// Machine-readable run summary.
#[derive(Debug, Serialize)]
pub(crate) struct JsonReport<'a> {
    window_start: Option<Date>,
    window_end: Option<Date>,
    prices: &'a [PriceSummary],
    models: BTreeMap<&'a str, &'a FittedModel>,
    scores: Vec<&'a ScoredSymbol>,
    portfolio: &'a Portfolio,
    failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
struct FailureEntry {
    symbol: String,
    stage: String,
    reason: String,
}

impl<'a> JsonReport<'a> {
    pub(crate) fn new(output: &'a PipelineOutput, prices: &'a [PriceSummary]) -> Self {
        Self {
            window_start: output.residuals.dates.first().copied(),
            window_end: output.residuals.dates.last().copied(),
            prices,
            models: output.models.iter().map(|(s, m)| (s.as_str(), m)).collect(),
            scores: output.scores.iter().collect(),
            portfolio: &output.portfolio,
            failures: output
                .failures
                .iter()
                .map(|f| FailureEntry {
                    symbol: f.symbol.to_string(),
                    stage: f.stage.to_string(),
                    reason: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Render the human-readable report.
pub(crate) fn render_text(
    output: &PipelineOutput,
    config: &PipelineConfig,
    prices: &[PriceSummary],
) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_report(&mut out, output, config, prices);
    out
}

fn write_report(
    out: &mut String,
    output: &PipelineOutput,
    config: &PipelineConfig,
    prices: &[PriceSummary],
) -> std::fmt::Result {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "RESIDUAL MOMENTUM PORTFOLIO")?;
    writeln!(out, "{RULE}")?;
    if let (Some(first), Some(last)) =
        (output.residuals.dates.first(), output.residuals.dates.last())
    {
        let months = output.residuals.n_dates();
        writeln!(out, "Residual window: {first} to {last} ({months} months)")?;
    }
    writeln!(
        out,
        "Buckets: top {}% / bottom {}%{}",
        config.portfolio.top_pct,
        config.portfolio.bottom_pct,
        if config.residuals.subtract_alpha { ", alpha removed from residuals" } else { "" }
    )?;
    writeln!(out, "{THIN_RULE}")?;

    if !prices.is_empty() {
        writeln!(out, "\nPRICE HISTORY:")?;
        write_price_table(out, prices)?;
    }

    writeln!(out, "\nFACTOR MODELS:")?;
    writeln!(
        out,
        "{:<10} {:>10} {:>9} {:>9} {:>9} {:>7} {:>5}",
        "Ticker", "Alpha", "Mkt-RF", "SMB", "HML", "R2", "Obs"
    )?;
    writeln!(out, "{}", "-".repeat(65))?;
    for (symbol, model) in &output.models {
        let b = &model.loadings;
        writeln!(
            out,
            "{:<10} {:>+10.4} {:>9.3} {:>9.3} {:>9.3} {:>7.3} {:>5}",
            symbol.as_str(),
            b.alpha,
            b.market,
            b.size,
            b.value,
            model.r_squared,
            model.n_obs
        )?;
    }

    writeln!(out, "\nRISK-ADJUSTED RESIDUAL MOMENTUM (ascending):")?;
    for scored in &output.scores {
        let side = if output.portfolio.is_long(scored.symbol.as_str()) {
            "BUY"
        } else if output.portfolio.is_short(scored.symbol.as_str()) {
            "SELL"
        } else {
            ""
        };
        writeln!(out, "  {:<10} {:>14.4}  {side}", scored.symbol.as_str(), scored.score)?;
    }

    let values: Vec<f64> = output.scores.iter().map(|s| s.score).collect();
    if !values.is_empty() {
        writeln!(out, "\nSCORE DISTRIBUTION:")?;
        let marks = [
            (output.portfolio.lower_threshold, "lower threshold"),
            (output.portfolio.upper_threshold, "upper threshold"),
        ];
        for line in histogram_lines(&values, &marks) {
            writeln!(out, "  {line}")?;
        }
    }

    writeln!(out, "\n{THIN_RULE}")?;
    write_bucket(out, "BUY", &output.portfolio.buy)?;
    write_bucket(out, "SELL", &output.portfolio.sell)?;
    writeln!(
        out,
        "Thresholds: lower {:.4}, upper {:.4}",
        output.portfolio.lower_threshold, output.portfolio.upper_threshold
    )?;

    if !output.failures.is_empty() {
        writeln!(out, "\nEXCLUDED ({}):", output.failures.len())?;
        for failure in &output.failures {
            writeln!(out, "  {failure}")?;
        }
    }
    writeln!(out, "{RULE}")
}

fn write_price_table(out: &mut String, prices: &[PriceSummary]) -> std::fmt::Result {
    writeln!(
        out,
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9} {:>5}",
        "Ticker", "From", "To", "First", "Last", "Min", "Max", "Obs"
    )?;
    writeln!(out, "{}", "-".repeat(81))?;
    for p in prices {
        writeln!(
            out,
            "{:<10} {:>10} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>9.2} {:>5}",
            p.symbol.as_str(),
            p.first.0.format("%Y-%m").to_string(),
            p.last.0.format("%Y-%m").to_string(),
            p.first.1,
            p.last.1,
            p.min,
            p.max,
            p.n_obs
        )?;
    }
    Ok(())
}

fn write_bucket<'a>(
    out: &mut String,
    label: &str,
    symbols: impl IntoIterator<Item = &'a resmom::primitives::Symbol>,
) -> std::fmt::Result {
    let names: Vec<&str> = symbols.into_iter().map(|s| s.as_str()).collect();
    if names.is_empty() {
        writeln!(out, "{label:<5} (none)")
    } else {
        writeln!(out, "{label:<5} {}", names.join(", "))
    }
}

/// Equal-width bins over `[min, max]`; the maximum falls in the last bin.
fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() || bins == 0 {
        return Vec::new();
    }
    if max <= min {
        return vec![(min, max, values.len())];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (min + width * i as f64, min + width * (i + 1) as f64, count))
        .collect()
}

/// Text histogram with a marker on each bin containing a threshold.
fn histogram_lines(values: &[f64], marks: &[(f64, &str)]) -> Vec<String> {
    let bins = histogram(values, HISTOGRAM_BINS);
    let tallest = bins.iter().map(|b| b.2).max().unwrap_or(0).max(1);
    let last = bins.len().saturating_sub(1);

    bins.iter()
        .enumerate()
        .map(|(i, &(lo, hi, count))| {
            let bar = "#".repeat(count * HISTOGRAM_WIDTH / tallest);
            let labels: Vec<&str> = marks
                .iter()
                .filter(|(x, _)| *x >= lo && (*x < hi || (i == last && *x <= hi)))
                .map(|(_, label)| *label)
                .collect();
            let note = if labels.is_empty() {
                String::new()
            } else {
                format!(" <- {}", labels.join(", "))
            };
            let width = HISTOGRAM_WIDTH;
            format!("[{lo:>10.3}, {hi:>10.3}) {count:>4} {bar:<width$}{note}")
        })
        .collect()
}
