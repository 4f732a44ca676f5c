//! Universe screening on one evaluation date.
//!
//! Each symbol is screened independently on the rayon pool: snapshot, rule
//! chain, risk manager. Outcomes are then handed to the `RankingAssembler`,
//! which sorts everything it reports, so the result does not depend on the
//! order the workers finish in.

use bandscan_core::domain::{DatasetHash, PriceSeries};
use bandscan_core::fingerprint::dataset_hash;
use bandscan_core::risk::RiskRejection;
use bandscan_core::{
    ConfigError, IndicatorEngine, RankingAssembler, RiskManager, ScreenConfig,
    ScreeningCandidate, ScreeningEngine, ScreeningResult, SymbolError,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;

use crate::data_loader::{LoadError, LoadedUniverse};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("no evaluation date: the universe has no bars")]
    NoEvaluationDate,
}

/// What happened to one symbol.
#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    Candidate(ScreeningCandidate),
    Rejected(RiskRejection),
    NoSignal,
    Skipped(SymbolError),
}

/// Screen a single symbol on `date`.
pub fn screen_symbol(series: &PriceSeries, date: NaiveDate, config: &ScreenConfig) -> SymbolOutcome {
    let engine = IndicatorEngine::new(config);
    let snapshot = match engine.snapshot(series, date) {
        Ok(snapshot) => snapshot,
        Err(e) => return SymbolOutcome::Skipped(e),
    };
    let Some(candidate) = ScreeningEngine::new(config).evaluate(&snapshot) else {
        return SymbolOutcome::NoSignal;
    };
    let history = engine.history(series, date).unwrap_or_default();
    match RiskManager::new(&config.risk).apply(candidate, history) {
        Ok(candidate) => SymbolOutcome::Candidate(candidate),
        Err(rejection) => SymbolOutcome::Rejected(rejection),
    }
}

/// Screen every series on `date`.
///
/// The configuration is validated first; an invalid one aborts the run.
/// Per-symbol problems are recorded in the result and never abort it.
pub fn screen_universe(
    universe: &[PriceSeries],
    date: NaiveDate,
    config: &ScreenConfig,
) -> Result<ScreeningResult, RunError> {
    screen_with_warnings(universe, dataset_hash(universe), date, config, Vec::new())
}

/// Screen a loaded universe; load failures become run warnings.
///
/// The result carries the hash computed at load time.
pub fn screen_loaded(
    loaded: &LoadedUniverse,
    date: NaiveDate,
    config: &ScreenConfig,
) -> Result<ScreeningResult, RunError> {
    let warnings = loaded
        .failures
        .iter()
        .map(|f| format!("{}: load failed: {}", f.symbol, f.reason))
        .collect();
    screen_with_warnings(
        &loaded.series,
        loaded.dataset_hash.clone(),
        date,
        config,
        warnings,
    )
}

fn screen_with_warnings(
    universe: &[PriceSeries],
    dataset_hash: DatasetHash,
    date: NaiveDate,
    config: &ScreenConfig,
    warnings: Vec<String>,
) -> Result<ScreeningResult, RunError> {
    config.validate()?;

    let outcomes: Vec<(String, SymbolOutcome)> = universe
        .par_iter()
        .map(|series| (series.symbol.clone(), screen_symbol(series, date, config)))
        .collect();

    let mut assembler = RankingAssembler::new(config, date, dataset_hash, universe.len());
    for warning in warnings {
        assembler.add_warning(warning);
    }
    for (symbol, outcome) in outcomes {
        match outcome {
            SymbolOutcome::Candidate(candidate) => assembler.add_candidate(candidate),
            SymbolOutcome::Rejected(rejection) => {
                tracing::debug!(symbol = %symbol, reason = ?rejection.reason, "risk rejected");
                assembler.add_rejection(rejection);
            }
            SymbolOutcome::NoSignal => assembler.add_no_signal(),
            SymbolOutcome::Skipped(error) => {
                match &error {
                    SymbolError::MalformedSeries(_) => {
                        tracing::warn!(symbol = %symbol, error = %error, "malformed series")
                    }
                    _ => tracing::debug!(symbol = %symbol, error = %error, "symbol skipped"),
                }
                assembler.add_skip(symbol, error);
            }
        }
    }

    let result = assembler.finish();
    let counts = &result.metadata.counts;
    tracing::info!(
        date = %date,
        universe = universe.len(),
        candidates = result.candidates.len(),
        skipped = result.metadata.skips.len(),
        risk_rejected = counts.risk_rejected,
        below_min_score = counts.below_min_score,
        "screen complete"
    );
    Ok(result)
}

/// Latest bar date across the universe.
pub fn latest_date(universe: &[PriceSeries]) -> Result<NaiveDate, RunError> {
    universe
        .iter()
        .filter_map(|s| s.last_date())
        .max()
        .ok_or(RunError::NoEvaluationDate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandscan_core::domain::PriceBar;
    use bandscan_core::SignalType;

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceBar::new(base + chrono::Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1_000)
            })
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn dip(symbol: &str, last: f64) -> PriceSeries {
        let mut closes = vec![100.0; 20];
        closes.push(last);
        series(symbol, &closes)
    }

    #[test]
    fn screen_symbol_outcomes() {
        let cfg = ScreenConfig::default();
        let s = dip("AAA", 90.0);
        let date = s.bars[20].date;
        assert!(matches!(
            screen_symbol(&s, date, &cfg),
            SymbolOutcome::Candidate(c) if c.signal == SignalType::BelowLower
        ));

        let flat_up = dip("BBB", 101.0);
        assert!(matches!(
            screen_symbol(&flat_up, date, &cfg),
            SymbolOutcome::NoSignal
        ));

        let short = series("CCC", &[100.0; 5]);
        assert!(matches!(
            screen_symbol(&short, short.bars[4].date, &cfg),
            SymbolOutcome::Skipped(SymbolError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn accepted_candidate_carries_metrics() {
        let cfg = ScreenConfig::default();
        let s = dip("AAA", 90.0);
        let SymbolOutcome::Candidate(c) = screen_symbol(&s, s.bars[20].date, &cfg) else {
            panic!("expected a candidate");
        };
        let risk = c.risk.unwrap();
        let metrics = risk.metrics.unwrap();
        assert!((metrics.max_drawdown - (-0.1)).abs() < 1e-12);
        assert!(metrics.var_95 < 0.0);
        assert_eq!(c.rule, "oversold_touch");
    }

    #[test]
    fn loaded_universe_keeps_its_hash() {
        let cfg = ScreenConfig::default();
        let s = dip("AAA", 90.0);
        let date = s.bars[20].date;
        let loaded = LoadedUniverse {
            series: vec![s],
            failures: Vec::new(),
            dataset_hash: DatasetHash::from_hash("from-loader"),
        };
        let result = screen_loaded(&loaded, date, &cfg).unwrap();
        assert_eq!(result.metadata.dataset_hash, DatasetHash::from_hash("from-loader"));

        let direct = screen_universe(&loaded.series, date, &cfg).unwrap();
        assert_eq!(direct.metadata.dataset_hash, dataset_hash(&loaded.series));
    }

    #[test]
    fn invalid_config_aborts() {
        let cfg = ScreenConfig {
            band_period: 0,
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(matches!(
            screen_universe(&[], date, &cfg),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn empty_universe_is_empty_result() {
        let cfg = ScreenConfig::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let result = screen_universe(&[], date, &cfg).unwrap();
        assert!(result.candidates.is_empty());
        assert_eq!(result.metadata.universe_size, 0);
    }

    #[test]
    fn latest_date_over_universe() {
        let a = series("AAA", &[1.0; 3]);
        let b = series("BBB", &[1.0; 5]);
        assert_eq!(latest_date(&[a, b.clone()]).unwrap(), b.bars[4].date);
        assert!(matches!(latest_date(&[]), Err(RunError::NoEvaluationDate)));
    }
}
