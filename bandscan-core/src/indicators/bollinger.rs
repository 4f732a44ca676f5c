//! Bollinger Bands: rolling mean +/- k standard deviations.
//!
//! - Middle: mean(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Population or sample stddev per `StdDevKind`. The window ends at the
//! evaluation bar inclusive. Undefined (`None`) until `period` closes exist.

use serde::{Deserialize, Serialize};

use super::rolling::{RollingWindow, WindowSums};
use crate::config::StdDevKind;

/// Rolling Bollinger statistics at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandState {
    pub period: usize,
    pub k: f64,
    pub std_dev_kind: StdDevKind,
    pub mean: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
}

impl BandState {
    fn from_moments(period: usize, k: f64, kind: StdDevKind, mean: f64, std_dev: f64) -> Self {
        Self {
            period,
            k,
            std_dev_kind: kind,
            mean,
            std_dev,
            upper: mean + k * std_dev,
            lower: mean - k * std_dev,
        }
    }

    /// Band width relative to the mean: (upper - lower) / mean.
    pub fn width_ratio(&self) -> f64 {
        if self.mean == 0.0 {
            return f64::INFINITY;
        }
        (self.upper - self.lower) / self.mean
    }

    /// Position of `close` within the band (%B): 0 at the lower band, 1 at the upper.
    /// `None` when the band has collapsed to a point.
    pub fn percent_b(&self, close: f64) -> Option<f64> {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            None
        } else {
            Some((close - self.lower) / width)
        }
    }

    /// Signed distance of `close` above the lower band.
    pub fn distance_to_lower(&self, close: f64) -> f64 {
        close - self.lower
    }
}

/// Batch computation over the trailing `period` closes of `closes`.
///
/// Sums the window from scratch. The tracker reaches the same integer sums by
/// sliding, so both paths produce the same bits.
pub fn band_at(closes: &[f64], period: usize, k: f64, kind: StdDevKind) -> Option<BandState> {
    if period == 0 || closes.len() < period {
        return None;
    }
    band_from_sums(&WindowSums::of(&closes[closes.len() - period..]), k, kind)
}

fn band_from_sums(sums: &WindowSums, k: f64, kind: StdDevKind) -> Option<BandState> {
    let mean = sums.mean()?;
    let std_dev = sums.std_dev(kind)?;
    Some(BandState::from_moments(sums.len, k, kind, mean, std_dev))
}

/// Batch series: one `band_at` per index.
pub fn band_series(closes: &[f64], period: usize, k: f64, kind: StdDevKind) -> Vec<Option<BandState>> {
    (0..closes.len())
        .map(|i| band_at(&closes[..=i], period, k, kind))
        .collect()
}

/// Incremental Bollinger computation backed by a `RollingWindow`.
#[derive(Debug, Clone)]
pub struct BandTracker {
    window: RollingWindow,
    k: f64,
    kind: StdDevKind,
}

impl BandTracker {
    pub fn new(period: usize, k: f64, kind: StdDevKind) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            window: RollingWindow::new(period),
            k,
            kind,
        }
    }

    /// Feed the next close and return the band ending at it.
    pub fn push(&mut self, close: f64) -> Option<BandState> {
        self.window.push(close);
        self.current()
    }

    pub fn current(&self) -> Option<BandState> {
        if !self.window.is_full() {
            return None;
        }
        band_from_sums(&self.window.sums(), self.k, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn middle_is_sma() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let series = band_series(&closes, 3, 2.0, StdDevKind::Population);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        // mean(10,11,12) = 11.0
        assert_approx(series[2].unwrap().mean, 11.0, DEFAULT_EPSILON);
        assert_approx(series[3].unwrap().mean, 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_symmetric() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        for band in band_series(&closes, 3, 2.0, StdDevKind::Population)
            .into_iter()
            .flatten()
        {
            assert_approx(band.upper - band.mean, band.mean - band.lower, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn population_vs_sample() {
        // Window 10, 11, 12: M2 = 2
        let pop = band_at(&[10.0, 11.0, 12.0], 3, 1.0, StdDevKind::Population).unwrap();
        let sample = band_at(&[10.0, 11.0, 12.0], 3, 1.0, StdDevKind::Sample).unwrap();
        assert_approx(pop.std_dev, (2.0f64 / 3.0).sqrt(), DEFAULT_EPSILON);
        assert_approx(sample.std_dev, 1.0, DEFAULT_EPSILON);
        assert!(sample.lower < pop.lower);
    }

    #[test]
    fn constant_price_collapses_band() {
        let closes = [100.0; 25];
        let band = band_at(&closes, 20, 2.0, StdDevKind::Population).unwrap();
        assert_eq!(band.std_dev, 0.0);
        assert_eq!(band.upper, 100.0);
        assert_eq!(band.lower, 100.0);
        assert_eq!(band.mean, 100.0);
        assert!(band.percent_b(100.0).is_none());
        assert_eq!(band.width_ratio(), 0.0);
    }

    #[test]
    fn too_short_history_is_none() {
        assert!(band_at(&[1.0; 19], 20, 2.0, StdDevKind::Population).is_none());
        assert!(band_at(&[1.0; 20], 20, 2.0, StdDevKind::Population).is_some());
    }

    #[test]
    fn tracker_matches_batch_exactly() {
        let closes: Vec<f64> = (0..2_000)
            .map(|i| 50.0 + (i as f64 * 0.21).cos() * 7.0)
            .collect();
        let batch = band_series(&closes, 20, 2.0, StdDevKind::Population);
        let mut tracker = BandTracker::new(20, 2.0, StdDevKind::Population);
        for (i, &c) in closes.iter().enumerate() {
            assert_eq!(tracker.push(c), batch[i], "at {i}");
        }
    }

    #[test]
    fn close_touching_lower_band_agrees_on_both_paths() {
        // Period 2, k = 1: the lower band is min(a, b) so the newest close can sit on it
        let closes = [10.07, 10.03, 10.11, 10.02, 10.09, 10.01];
        let mut tracker = BandTracker::new(2, 1.0, StdDevKind::Population);
        for i in 0..closes.len() {
            let inc = tracker.push(closes[i]);
            let batch = band_at(&closes[..=i], 2, 1.0, StdDevKind::Population);
            assert_eq!(inc, batch);
            if let (Some(a), Some(b)) = (inc, batch) {
                assert_eq!(closes[i] < a.lower, closes[i] < b.lower);
                assert_eq!(a.lower.to_bits(), b.lower.to_bits());
            }
        }
    }

    #[test]
    fn percent_b_and_distance() {
        let band = band_at(&[10.0, 11.0, 12.0], 3, 1.0, StdDevKind::Sample).unwrap();
        // lower = 10, upper = 12
        assert_approx(band.percent_b(10.0).unwrap(), 0.0, DEFAULT_EPSILON);
        assert_approx(band.percent_b(11.0).unwrap(), 0.5, DEFAULT_EPSILON);
        assert_approx(band.distance_to_lower(9.5), -0.5, DEFAULT_EPSILON);
    }
}
