//! Bandscan CLI: Bollinger Band mean-reversion screening from the command line.
//!
//! Commands:
//! - `screen`: rank the universe on one evaluation date and print the result as JSON
//! - `scan`: list every qualifying date over a range (opportunity scan)
//!
//! Logs go to stderr. `-v` enables info, `--debug` enables debug; `RUST_LOG`
//! overrides both.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bandscan_core::ranking::ScreeningResult;
use bandscan_core::ScreenConfig;
use bandscan_runner::{
    latest_date, load_directory, scan_opportunities, screen_loaded, DateRange, LoadedUniverse,
    ScreenFile,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "bandscan",
    about = "Bollinger Band mean-reversion screener"
)]
struct Cli {
    /// Info-level logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Debug-level logging (per-symbol skips).
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by both commands.
#[derive(Args)]
struct InputArgs {
    /// Path to a TOML config file with a [screen] table.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of <SYMBOL>.csv files. Overrides [data].dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Symbols to load. Defaults to [data].symbols, then every file in the directory.
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen the universe on one date.
    Screen {
        #[command(flatten)]
        input: InputArgs,

        /// Evaluation date (YYYY-MM-DD). Defaults to the latest date in the data.
        #[arg(long)]
        date: Option<String>,

        /// Keep only the best N candidates. Overrides the config file.
        #[arg(long)]
        top_k: Option<usize>,

        /// Drop candidates below this score. Overrides the config file.
        #[arg(long)]
        min_score: Option<f64>,

        /// Print a short summary to stderr.
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// List every date on which a symbol qualified.
    Scan {
        #[command(flatten)]
        input: InputArgs,

        /// First date to report (YYYY-MM-DD).
        #[arg(long)]
        from: Option<String>,

        /// Last date to report (YYYY-MM-DD).
        #[arg(long)]
        to: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Screen {
            input,
            date,
            top_k,
            min_score,
            summary,
        } => run_screen(input, date, top_k, min_score, summary),
        Commands::Scan { input, from, to } => run_scan(input, from, to),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_screen(
    input: InputArgs,
    date: Option<String>,
    top_k: Option<usize>,
    min_score: Option<f64>,
    summary: bool,
) -> Result<()> {
    let (mut config, loaded) = load_inputs(&input)?;
    if top_k.is_some() {
        config.top_k = top_k;
    }
    if let Some(min_score) = min_score {
        config.min_score = min_score;
    }

    let date = match date.as_deref() {
        Some(s) => parse_date(s)?,
        None => latest_date(&loaded.series)?,
    };
    tracing::info!(%date, symbols = loaded.series.len(), "screening");

    let result = screen_loaded(&loaded, date, &config)?;
    if summary {
        print_summary(&result);
    }
    write_json(&result, input.output.as_deref())
}

fn run_scan(input: InputArgs, from: Option<String>, to: Option<String>) -> Result<()> {
    let (config, loaded) = load_inputs(&input)?;
    let range = DateRange {
        from: from.as_deref().map(parse_date).transpose()?,
        to: to.as_deref().map(parse_date).transpose()?,
    };
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            bail!("--from ({from}) is after --to ({to})");
        }
    }

    let report = scan_opportunities(&loaded.series, range, &config)?;
    for failure in &loaded.failures {
        eprintln!("Load failed for {}: {}", failure.symbol, failure.reason);
    }
    write_json(&report, input.output.as_deref())
}

/// Config file (or defaults) plus the loaded price universe.
fn load_inputs(input: &InputArgs) -> Result<(ScreenConfig, LoadedUniverse)> {
    let file = match &input.config {
        Some(path) => ScreenFile::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScreenFile::default(),
    };

    let Some(dir) = input.data_dir.clone().or(file.data.dir.clone()) else {
        bail!("no data directory: pass --data-dir or set [data].dir in the config file");
    };
    let symbols = if input.symbols.is_empty() {
        file.data.symbols.clone()
    } else {
        input.symbols.clone()
    };

    let loaded = load_directory(&dir, &symbols)
        .with_context(|| format!("loading prices from {}", dir.display()))?;
    if loaded.series.is_empty() {
        bail!("no price series loaded from {}", dir.display());
    }
    Ok((file.screen, loaded))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Result written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(result: &ScreeningResult) {
    let summary = result.summary();
    let meta = &result.metadata;
    eprintln!();
    eprintln!("=== Screen {} ===", result.date);
    eprintln!("Universe:       {}", meta.universe_size);
    eprintln!("Evaluated:      {}", meta.evaluated);
    eprintln!("Skipped:        {}", meta.skips.len());
    eprintln!("Risk rejected:  {}", meta.counts.risk_rejected);
    eprintln!("Candidates:     {}", summary.count);
    if let Some(mean) = summary.mean_score {
        eprintln!("Mean score:     {mean:.3}");
    }
    if let (Some(lo), Some(hi)) = (summary.min_close, summary.max_close) {
        eprintln!("Close range:    {lo:.2} to {hi:.2}");
    }
    for (signal, count) in &summary.signals {
        eprintln!("  {signal:?}: {count}");
    }
    eprintln!("Config hash:    {}", meta.config_hash);
    eprintln!("Dataset hash:   {}", meta.dataset_hash);
    for warning in &meta.warnings {
        eprintln!("Warning: {warning}");
    }
}
