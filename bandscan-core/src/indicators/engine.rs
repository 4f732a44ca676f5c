//! IndicatorEngine: every indicator for one symbol on one date.
//!
//! Two paths produce the same [`IndicatorSnapshot`]:
//! - [`IndicatorEngine::snapshot`] recomputes from the bars up to the evaluation date.
//! - [`IndicatorState::push`] advances trackers one bar at a time (amortized O(1)).
//!
//! The two paths match bit for bit. Band statistics come from exact integer
//! window sums and the volume ratio from an exact integer volume sum, so a close
//! sitting on the lower band classifies the same way on both.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bollinger::{band_at, BandState, BandTracker};
use super::macd::{macd_series, MacdTracker, MacdValue};
use super::momentum::momentum_at;
use super::rsi::{rsi_series, RsiTracker};
use super::volume::{volume_ratio_at, VolumeRatioTracker};
use crate::config::ScreenConfig;
use crate::domain::{PriceBar, PriceSeries, SeriesError, Symbol};

/// Why a symbol could not be evaluated. Always recoverable: the symbol is skipped.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SymbolError {
    #[error("insufficient history: {required} bars required, {available} available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("malformed series: {0}")]
    MalformedSeries(#[from] SeriesError),

    #[error("no bar on evaluation date {date}")]
    NoBarOnDate { date: NaiveDate },
}

/// All indicator values for one symbol on one date.
///
/// Optional fields are `None` when their warmup has not completed; they are
/// never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub band: BandState,
    pub prev_close: Option<f64>,
    pub prev_band: Option<BandState>,
    pub rsi: Option<f64>,
    /// Trailing RSI values, oldest first, ending with `rsi`. At most
    /// `momentum_lookback + 1` entries.
    pub recent_rsi: Vec<f64>,
    pub macd: Option<MacdValue>,
    pub prev_macd_histogram: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub price_momentum: Option<f64>,
}

/// Batch indicator computation for a validated configuration.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEngine<'a> {
    config: &'a ScreenConfig,
}

impl<'a> IndicatorEngine<'a> {
    pub fn new(config: &'a ScreenConfig) -> Self {
        Self { config }
    }

    /// Snapshot on `date`, computed from scratch.
    ///
    /// Only bars up to and including `date` are used, further limited to the
    /// trailing `max_history_bars` when that budget is set.
    pub fn snapshot(
        &self,
        series: &PriceSeries,
        date: NaiveDate,
    ) -> Result<IndicatorSnapshot, SymbolError> {
        series.validate()?;
        let history = self
            .history(series, date)
            .ok_or(SymbolError::NoBarOnDate { date })?;
        self.snapshot_from_history(&series.symbol, history)
    }

    /// Bars through `date`, trimmed to the trailing `max_history_bars`.
    /// `None` when the series has no bar on `date`.
    pub fn history<'s>(&self, series: &'s PriceSeries, date: NaiveDate) -> Option<&'s [PriceBar]> {
        let history = series.history_through(date)?;
        Some(match self.config.max_history_bars {
            Some(budget) if history.len() > budget => &history[history.len() - budget..],
            _ => history,
        })
    }

    fn snapshot_from_history(
        &self,
        symbol: &str,
        history: &[PriceBar],
    ) -> Result<IndicatorSnapshot, SymbolError> {
        let cfg = self.config;
        let required = cfg.gating_window();
        let n = history.len();
        let insufficient = SymbolError::InsufficientHistory {
            required,
            available: n,
        };
        let Some(bar) = history.last() else {
            return Err(insufficient);
        };
        if n < required {
            return Err(insufficient);
        }

        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        let volumes: Vec<u64> = history.iter().map(|b| b.volume).collect();

        let band = band_at(&closes, cfg.band_period, cfg.band_k, cfg.std_dev_kind)
            .ok_or(insufficient)?;
        let prev_band = band_at(
            &closes[..n - 1],
            cfg.band_period,
            cfg.band_k,
            cfg.std_dev_kind,
        );

        let rsi = rsi_series(&closes, cfg.rsi_period);
        let recent_rsi = trailing_available(&rsi, cfg.momentum_lookback + 1);

        let macd = macd_series(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        let prev_macd_histogram = if n >= 2 {
            macd[n - 2].map(|m| m.histogram)
        } else {
            None
        };

        Ok(IndicatorSnapshot {
            symbol: symbol.to_string(),
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            band,
            prev_close: (n >= 2).then(|| closes[n - 2]),
            prev_band,
            rsi: rsi[n - 1],
            recent_rsi,
            macd: macd[n - 1],
            prev_macd_histogram,
            volume_ratio: volume_ratio_at(&volumes, cfg.volume_window),
            price_momentum: momentum_at(&closes, cfg.momentum_period),
        })
    }

    /// Fresh incremental state for one symbol.
    pub fn state(&self, symbol: impl Into<Symbol>) -> IndicatorState {
        IndicatorState::new(self.config, symbol)
    }

    /// Feed the whole series through an [`IndicatorState`], one result per bar.
    ///
    /// Bars before the gating window is filled yield `InsufficientHistory`.
    /// `max_history_bars` does not apply here.
    pub fn scan(
        &self,
        series: &PriceSeries,
    ) -> Result<Vec<Result<IndicatorSnapshot, SymbolError>>, SymbolError> {
        series.validate()?;
        let mut state = self.state(series.symbol.clone());
        Ok(series.bars.iter().map(|bar| state.push(bar)).collect())
    }
}

/// Up to `count` trailing `Some` values, oldest first.
fn trailing_available(values: &[Option<f64>], count: usize) -> Vec<f64> {
    let mut out: Vec<f64> = values
        .iter()
        .rev()
        .map_while(|v| *v)
        .take(count)
        .collect();
    out.reverse();
    out
}

/// Incremental indicator state for one symbol.
#[derive(Debug, Clone)]
pub struct IndicatorState {
    symbol: Symbol,
    gating_window: usize,
    momentum_period: usize,
    rsi_keep: usize,
    band: BandTracker,
    rsi: RsiTracker,
    macd: MacdTracker,
    volume: VolumeRatioTracker,
    closes: VecDeque<f64>,
    recent_rsi: VecDeque<f64>,
    prev_close: Option<f64>,
    prev_macd_histogram: Option<f64>,
    last_date: Option<NaiveDate>,
    bars_seen: usize,
}

impl IndicatorState {
    pub fn new(config: &ScreenConfig, symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            gating_window: config.gating_window(),
            momentum_period: config.momentum_period,
            rsi_keep: config.momentum_lookback + 1,
            band: BandTracker::new(config.band_period, config.band_k, config.std_dev_kind),
            rsi: RsiTracker::new(config.rsi_period),
            macd: MacdTracker::new(config.macd_fast, config.macd_slow, config.macd_signal),
            volume: VolumeRatioTracker::new(config.volume_window),
            closes: VecDeque::with_capacity(config.momentum_period + 1),
            recent_rsi: VecDeque::with_capacity(config.momentum_lookback + 1),
            prev_close: None,
            prev_macd_histogram: None,
            last_date: None,
            bars_seen: 0,
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Advance by one bar.
    ///
    /// A bar that is out of order or has invalid prices is refused with
    /// `MalformedSeries` and leaves the state untouched.
    pub fn push(&mut self, bar: &PriceBar) -> Result<IndicatorSnapshot, SymbolError> {
        if !bar.is_sane() {
            return Err(SeriesError::InvalidPrice { date: bar.date }.into());
        }
        if let Some(previous) = self.last_date {
            if bar.date <= previous {
                return Err(SeriesError::NonMonotonicDates {
                    index: self.bars_seen,
                    previous,
                    current: bar.date,
                }
                .into());
            }
        }

        let prev_close = self.prev_close.replace(bar.close);
        let prev_band = self.band.current();
        let prev_macd_histogram = self.prev_macd_histogram;
        self.last_date = Some(bar.date);
        self.bars_seen += 1;

        let band = self.band.push(bar.close);
        let rsi = self.rsi.push(bar.close);
        let macd = self.macd.push(bar.close);
        let volume_ratio = self.volume.push(bar.volume);

        if let Some(value) = rsi {
            if self.recent_rsi.len() == self.rsi_keep {
                self.recent_rsi.pop_front();
            }
            self.recent_rsi.push_back(value);
        }
        if self.closes.len() == self.momentum_period + 1 {
            self.closes.pop_front();
        }
        self.closes.push_back(bar.close);
        self.prev_macd_histogram = macd.map(|m| m.histogram);

        let insufficient = SymbolError::InsufficientHistory {
            required: self.gating_window,
            available: self.bars_seen,
        };
        if self.bars_seen < self.gating_window {
            return Err(insufficient);
        }
        let band = band.ok_or(insufficient)?;

        Ok(IndicatorSnapshot {
            symbol: self.symbol.clone(),
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            band,
            prev_close,
            prev_band,
            rsi,
            recent_rsi: self.recent_rsi.iter().copied().collect(),
            macd,
            prev_macd_histogram,
            volume_ratio,
            price_momentum: self.price_momentum(),
        })
    }

    fn price_momentum(&self) -> Option<f64> {
        if self.closes.len() <= self.momentum_period {
            return None;
        }
        let base = *self.closes.front()?;
        let last = *self.closes.back()?;
        if base <= 0.0 {
            return None;
        }
        Some(last / base - 1.0)
    }
}
