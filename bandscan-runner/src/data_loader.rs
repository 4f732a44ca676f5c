//! Price loading from a directory of `<SYMBOL>.csv` files.
//!
//! Header: `date,open,high,low,close,volume`. Rows keep file order. Structural
//! validation (ordering, duplicates, bad prices) is left to the screener, so a
//! malformed series is reported as a skip plus a warning, not a load failure.
//! A file that cannot be read or parsed becomes a [`LoadFailure`] and the rest
//! of the directory still loads.

use std::path::{Path, PathBuf};

use bandscan_core::domain::{DatasetHash, PriceBar, PriceSeries};
use bandscan_core::fingerprint::dataset_hash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read data directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error in {symbol}: {source}")]
    Csv { symbol: String, source: csv::Error },

    #[error("{symbol}: file contains no rows")]
    EmptyFile { symbol: String },
}

/// One row of a price file.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        PriceBar::new(row.date, row.open, row.high, row.low, row.close, row.volume)
    }
}

/// A file that was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    /// Sorted by symbol.
    pub series: Vec<PriceSeries>,
    /// Sorted by symbol.
    pub failures: Vec<LoadFailure>,
    pub dataset_hash: DatasetHash,
}

/// Parse CSV content for one symbol.
pub fn parse_series(symbol: &str, reader: impl std::io::Read) -> Result<PriceSeries, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut bars = Vec::new();
    for row in csv_reader.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            symbol: symbol.to_string(),
            source,
        })?;
        bars.push(PriceBar::from(row));
    }
    if bars.is_empty() {
        return Err(LoadError::EmptyFile {
            symbol: symbol.to_string(),
        });
    }
    Ok(PriceSeries::new(symbol, bars))
}

/// Load one file; the symbol is the file stem.
pub fn load_series_file(path: &Path) -> Result<PriceSeries, LoadError> {
    let symbol = symbol_of(path);
    let file = std::fs::File::open(path).map_err(|e| LoadError::Csv {
        symbol: symbol.clone(),
        source: csv::Error::from(e),
    })?;
    parse_series(&symbol, file)
}

/// Load every `*.csv` in `dir`, or only the listed symbols when `symbols` is non-empty.
///
/// Only an unreadable directory is an error. Listed symbols without a file are
/// reported as failures.
pub fn load_directory(dir: &Path, symbols: &[String]) -> Result<LoadedUniverse, LoadError> {
    let read_dir_err = |source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let paths: Vec<PathBuf> = if symbols.is_empty() {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                found.push(path);
            }
        }
        found
    } else {
        if !dir.is_dir() {
            return Err(read_dir_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not a directory",
            )));
        }
        symbols
            .iter()
            .map(|s| dir.join(format!("{s}.csv")))
            .collect()
    };

    let mut series = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in &paths {
        match load_series_file(path) {
            Ok(s) => series.push(s),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping price file");
                failures.push(LoadFailure {
                    symbol: symbol_of(path),
                    reason: e.to_string(),
                });
            }
        }
    }
    series.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    tracing::info!(
        dir = %dir.display(),
        loaded = series.len(),
        failed = failures.len(),
        "loaded price universe"
    );

    Ok(LoadedUniverse {
        dataset_hash: dataset_hash(&series),
        series,
        failures,
    })
}

fn symbol_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
