//! Ranking: ordered, truncated candidate list plus the run's audit trail.
//!
//! Order: score descending (`f64::total_cmp`), then symbol ascending. Candidates
//! under `min_score` are dropped before sorting; `top_k` truncates after.
//! Skips and rejections are sorted by symbol so the result never depends on
//! the order symbols were processed in.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ScreenConfig;
use crate::domain::{ConfigHash, DatasetHash, Symbol};
use crate::indicators::SymbolError;
use crate::risk::RiskRejection;
use crate::screening::{ScreeningCandidate, SignalType};

/// A symbol that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSkip {
    pub symbol: Symbol,
    pub error: SymbolError,
}

/// How many symbols ended up where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExclusionCounts {
    pub insufficient_history: usize,
    pub malformed: usize,
    pub no_bar_on_date: usize,
    /// Evaluated, but no rule matched.
    pub no_signal: usize,
    pub risk_rejected: usize,
    pub below_min_score: usize,
    /// Cut by `top_k`.
    pub truncated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub config: ScreenConfig,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub universe_size: usize,
    pub evaluated: usize,
    pub counts: ExclusionCounts,
    pub skips: Vec<SymbolSkip>,
    pub risk_rejections: Vec<RiskRejection>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub date: NaiveDate,
    pub candidates: Vec<ScreeningCandidate>,
    pub metadata: RunMetadata,
}

/// Short overview of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub count: usize,
    pub mean_score: Option<f64>,
    pub min_close: Option<f64>,
    pub max_close: Option<f64>,
    pub signals: BTreeMap<SignalType, usize>,
}

impl ScreeningResult {
    pub fn summary(&self) -> ResultSummary {
        let count = self.candidates.len();
        let mut signals = BTreeMap::new();
        for c in &self.candidates {
            *signals.entry(c.signal).or_insert(0) += 1;
        }
        let closes = self.candidates.iter().map(|c| c.close);
        ResultSummary {
            count,
            mean_score: (count > 0).then(|| {
                self.candidates.iter().map(|c| c.score).sum::<f64>() / count as f64
            }),
            min_close: closes.clone().min_by(f64::total_cmp),
            max_close: closes.max_by(f64::total_cmp),
            signals,
        }
    }
}

/// The total order over candidates.
pub fn compare_candidates(a: &ScreeningCandidate, b: &ScreeningCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Collects per-symbol outcomes and builds the [`ScreeningResult`].
#[derive(Debug)]
pub struct RankingAssembler<'a> {
    config: &'a ScreenConfig,
    date: NaiveDate,
    dataset_hash: DatasetHash,
    universe_size: usize,
    evaluated: usize,
    no_signal: usize,
    candidates: Vec<ScreeningCandidate>,
    skips: Vec<SymbolSkip>,
    rejections: Vec<RiskRejection>,
    warnings: Vec<String>,
}

impl<'a> RankingAssembler<'a> {
    pub fn new(
        config: &'a ScreenConfig,
        date: NaiveDate,
        dataset_hash: DatasetHash,
        universe_size: usize,
    ) -> Self {
        Self {
            config,
            date,
            dataset_hash,
            universe_size,
            evaluated: 0,
            no_signal: 0,
            candidates: Vec::new(),
            skips: Vec::new(),
            rejections: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_candidate(&mut self, candidate: ScreeningCandidate) {
        self.evaluated += 1;
        self.candidates.push(candidate);
    }

    pub fn add_no_signal(&mut self) {
        self.evaluated += 1;
        self.no_signal += 1;
    }

    pub fn add_rejection(&mut self, rejection: RiskRejection) {
        self.evaluated += 1;
        self.rejections.push(rejection);
    }

    /// Malformed series are also surfaced as warnings.
    pub fn add_skip(&mut self, symbol: impl Into<Symbol>, error: SymbolError) {
        let symbol = symbol.into();
        if matches!(error, SymbolError::MalformedSeries(_)) {
            self.warnings.push(format!("{symbol}: {error}"));
        }
        self.skips.push(SymbolSkip { symbol, error });
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn finish(self) -> ScreeningResult {
        let mut counts = ExclusionCounts {
            no_signal: self.no_signal,
            risk_rejected: self.rejections.len(),
            ..ExclusionCounts::default()
        };
        for skip in &self.skips {
            match skip.error {
                SymbolError::InsufficientHistory { .. } => counts.insufficient_history += 1,
                SymbolError::MalformedSeries(_) => counts.malformed += 1,
                SymbolError::NoBarOnDate { .. } => counts.no_bar_on_date += 1,
            }
        }

        let (candidates, below_min_score, truncated) =
            rank(self.candidates, self.config.min_score, self.config.top_k);
        counts.below_min_score = below_min_score;
        counts.truncated = truncated;

        let mut skips = self.skips;
        skips.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let mut risk_rejections = self.rejections;
        risk_rejections.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let mut warnings = self.warnings;
        warnings.sort();

        ScreeningResult {
            date: self.date,
            candidates,
            metadata: RunMetadata {
                config: self.config.clone(),
                config_hash: self.config.config_hash(),
                dataset_hash: self.dataset_hash,
                universe_size: self.universe_size,
                evaluated: self.evaluated,
                counts,
                skips,
                risk_rejections,
                warnings,
            },
        }
    }
}

/// Floor, sort and truncate. Returns the survivors plus the number dropped by
/// the floor and by truncation.
pub fn rank(
    candidates: Vec<ScreeningCandidate>,
    min_score: f64,
    top_k: Option<usize>,
) -> (Vec<ScreeningCandidate>, usize, usize) {
    let before = candidates.len();
    let mut kept: Vec<ScreeningCandidate> = candidates
        .into_iter()
        .filter(|c| c.score >= min_score)
        .collect();
    let below_min = before - kept.len();

    kept.sort_by(compare_candidates);

    let mut truncated = 0;
    if let Some(k) = top_k {
        if kept.len() > k {
            truncated = kept.len() - k;
            kept.truncate(k);
        }
    }
    (kept, below_min, truncated)
}
