//! Opportunity scan: every date on which a symbol qualified.
//!
//! Each series is fed once through the incremental indicator state, and every
//! bar inside the requested date range is screened and risk-checked. Symbols run
//! in parallel; the merged list is sorted by date, then score descending, then
//! symbol.

use std::collections::BTreeMap;

use bandscan_core::domain::PriceSeries;
use bandscan_core::ranking::{compare_candidates, SymbolSkip};
use bandscan_core::{
    IndicatorEngine, RiskManager, ScreenConfig, ScreeningCandidate, ScreeningEngine, SignalType,
    SymbolError,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::screener::RunError;

/// Inclusive date range. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityReport {
    pub range: DateRange,
    pub symbols_scanned: usize,
    pub opportunities: Vec<ScreeningCandidate>,
    pub by_signal: BTreeMap<SignalType, usize>,
    pub risk_rejected: usize,
    /// Symbols whose series could not be scanned at all.
    pub skips: Vec<SymbolSkip>,
}

struct SymbolScan {
    candidates: Vec<ScreeningCandidate>,
    risk_rejected: usize,
}

fn scan_symbol(
    series: &PriceSeries,
    range: DateRange,
    config: &ScreenConfig,
) -> Result<SymbolScan, SymbolError> {
    let screening = ScreeningEngine::new(config);
    let risk = RiskManager::new(&config.risk);
    let mut scan = SymbolScan {
        candidates: Vec::new(),
        risk_rejected: 0,
    };
    let scanned = IndicatorEngine::new(config).scan(series)?;
    for (i, snapshot) in scanned.into_iter().enumerate() {
        let Ok(snapshot) = snapshot else {
            continue;
        };
        if !range.contains(snapshot.date) {
            continue;
        }
        let Some(candidate) = screening.evaluate(&snapshot) else {
            continue;
        };
        if candidate.score < config.min_score {
            continue;
        }
        match risk.apply(candidate, &series.bars[..=i]) {
            Ok(candidate) => scan.candidates.push(candidate),
            Err(_) => scan.risk_rejected += 1,
        }
    }
    Ok(scan)
}

/// Scan every series over `range`.
pub fn scan_opportunities(
    universe: &[PriceSeries],
    range: DateRange,
    config: &ScreenConfig,
) -> Result<OpportunityReport, RunError> {
    config.validate()?;

    let scans: Vec<(String, Result<SymbolScan, SymbolError>)> = universe
        .par_iter()
        .map(|series| (series.symbol.clone(), scan_symbol(series, range, config)))
        .collect();

    let mut opportunities = Vec::new();
    let mut skips = Vec::new();
    let mut risk_rejected = 0;
    for (symbol, scan) in scans {
        match scan {
            Ok(scan) => {
                tracing::debug!(
                    symbol = %symbol,
                    found = scan.candidates.len(),
                    "symbol scanned"
                );
                risk_rejected += scan.risk_rejected;
                opportunities.extend(scan.candidates);
            }
            Err(error) => {
                tracing::warn!(symbol = %symbol, error = %error, "symbol not scanned");
                skips.push(SymbolSkip { symbol, error });
            }
        }
    }

    opportunities.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| compare_candidates(a, b)));
    skips.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut by_signal = BTreeMap::new();
    for c in &opportunities {
        *by_signal.entry(c.signal).or_insert(0) += 1;
    }

    tracing::info!(
        symbols = universe.len(),
        opportunities = opportunities.len(),
        risk_rejected,
        "opportunity scan complete"
    );

    Ok(OpportunityReport {
        range,
        symbols_scanned: universe.len() - skips.len(),
        opportunities,
        by_signal,
        risk_rejected,
        skips,
    })
}
