//! Indicator computations.
//!
//! Every indicator has a batch function (recomputes from the closes it is given)
//! and a tracker (fed one bar at a time). The trackers apply the same recurrences
//! as the batch functions; rolling-window statistics use [`rolling::RollingWindow`].
//!
//! [`engine::IndicatorEngine`] combines them into one [`engine::IndicatorSnapshot`]
//! per symbol and date.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod momentum;
pub mod rolling;
pub mod rsi;
pub mod volume;

pub use bollinger::{band_at, band_series, BandState, BandTracker};
pub use ema::{ema_of_series, EmaTracker};
pub use engine::{IndicatorEngine, IndicatorSnapshot, IndicatorState, SymbolError};
pub use macd::{macd_series, MacdTracker, MacdValue};
pub use momentum::momentum_at;
pub use rolling::{RollingWindow, WindowSums};
pub use rsi::{rsi_series, RsiTracker};
pub use volume::{volume_ratio_at, VolumeRatioTracker};

/// Create a synthetic series from closes for testing.
///
/// open = prev_close (or close for the first bar), high = max(open, close) + 1,
/// low = max(min(open, close) - 1, 0), volume = 1000. Dates are consecutive days.
#[cfg(test)]
pub fn make_series(symbol: &str, closes: &[f64]) -> crate::domain::PriceSeries {
    let volumes = vec![1_000; closes.len()];
    make_series_with_volume(symbol, closes, &volumes)
}

#[cfg(test)]
pub fn make_series_with_volume(
    symbol: &str,
    closes: &[f64],
    volumes: &[u64],
) -> crate::domain::PriceSeries {
    use crate::domain::{PriceBar, PriceSeries};
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                (open.min(close) - 1.0).max(0.0),
                close,
                volume,
            )
        })
        .collect();
    PriceSeries::new(symbol, bars)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
