//! Sub-scores and the composite score.
//!
//! - band: 1 - (close - lower) / (mean - lower), 1 at or below the lower band, 0 at the mean.
//! - volume: (ratio - 1) / (volume_saturation_ratio - 1).
//! - momentum: mean of the available RSI and MACD components.
//!
//! Every sub-score is clamped to [0, 1]. The composite is the weighted sum.

use serde::{Deserialize, Serialize};

use crate::config::{ScoreWeights, ScreenConfig};
use crate::indicators::{BandState, IndicatorSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub band: f64,
    pub volume: f64,
    pub momentum: f64,
}

impl SubScores {
    pub fn compute(snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> Self {
        Self {
            band: band_score(&snapshot.band, snapshot.close),
            volume: volume_score(snapshot.volume_ratio, config.volume_saturation_ratio),
            momentum: momentum_score(snapshot, config.momentum_lookback),
        }
    }

    pub fn composite(&self, weights: &ScoreWeights) -> f64 {
        clamp_unit(
            weights.band_weight * self.band
                + weights.volume_weight * self.volume
                + weights.momentum_weight * self.momentum,
        )
    }
}

/// Which confirmations held.
///
/// `volume`, `macd_turning` and `momentum_up` set the risk level through
/// [`Confirmations::risk_factors`]. `rsi_rising` is reported only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Confirmations {
    pub volume: bool,
    pub rsi_rising: bool,
    pub macd_turning: bool,
    /// Price momentum above `momentum_confirmation`.
    pub momentum_up: bool,
}

impl Confirmations {
    pub fn compute(snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> Self {
        Self {
            volume: super::signal::volume_confirmed(snapshot, config),
            rsi_rising: rsi_component(&snapshot.recent_rsi, config.momentum_lookback)
                .is_some_and(|c| c > 0.0),
            macd_turning: macd_component(snapshot).is_some_and(|c| c > 0.0),
            momentum_up: snapshot
                .price_momentum
                .is_some_and(|m| m > config.momentum_confirmation),
        }
    }

    pub fn count(&self) -> usize {
        [self.volume, self.rsi_rising, self.macd_turning, self.momentum_up]
            .iter()
            .filter(|&&held| held)
            .count()
    }

    /// Confirmations that lower the risk level: volume, MACD and price momentum.
    pub fn risk_factors(&self) -> usize {
        [self.volume, self.macd_turning, self.momentum_up]
            .iter()
            .filter(|&&held| held)
            .count()
    }
}

pub fn band_score(band: &BandState, close: f64) -> f64 {
    let span = band.mean - band.lower;
    if span <= 0.0 {
        return if close <= band.lower { 1.0 } else { 0.0 };
    }
    clamp_unit(1.0 - (close - band.lower) / span)
}

pub fn volume_score(ratio: Option<f64>, saturation: f64) -> f64 {
    match ratio {
        Some(r) => clamp_unit((r - 1.0) / (saturation - 1.0)),
        None => 0.0,
    }
}

pub fn momentum_score(snapshot: &IndicatorSnapshot, lookback: usize) -> f64 {
    let parts: Vec<f64> = [
        rsi_component(&snapshot.recent_rsi, lookback),
        macd_component(snapshot),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        0.0
    } else {
        clamp_unit(parts.iter().sum::<f64>() / parts.len() as f64)
    }
}

/// 1.0 when RSI strictly rose over each of the last `lookback` bars, 0.5 when only
/// the last bar rose, 0 otherwise. `None` without two RSI values.
fn rsi_component(recent: &[f64], lookback: usize) -> Option<f64> {
    if recent.len() < 2 {
        return None;
    }
    let rising = |w: &[f64]| w[1] > w[0];
    let last_rose = rising(&recent[recent.len() - 2..]);
    if !last_rose {
        return Some(0.0);
    }
    let full = recent.len() > lookback && recent.windows(2).rev().take(lookback).all(rising);
    Some(if full { 1.0 } else { 0.5 })
}

/// Histogram below zero and rising: min(1, (h - h_prev) / -h_prev). `None` without
/// both histogram values.
fn macd_component(snapshot: &IndicatorSnapshot) -> Option<f64> {
    let current = snapshot.macd?.histogram;
    let previous = snapshot.prev_macd_histogram?;
    if previous < 0.0 && current > previous {
        Some(((current - previous) / -previous).min(1.0))
    } else {
        Some(0.0)
    }
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
