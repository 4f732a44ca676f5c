//! Screening: rule chain, sub-scores and candidates.
//!
//! The engine sees only an [`IndicatorSnapshot`](crate::indicators::IndicatorSnapshot)
//! and the configuration. Risk checks and ranking happen downstream.

pub mod candidate;
pub mod engine;
pub mod scoring;
pub mod signal;

pub use candidate::ScreeningCandidate;
pub use engine::ScreeningEngine;
pub use scoring::{Confirmations, SubScores};
pub use signal::{
    classify, default_chain, first_match, NearLowerTouch, OversoldTouch, ReboundInProgress, ReversionRule,
    SignalType,
};

/// Snapshot with a symmetric band around `mean` whose lower edge is `lower`.
/// Every optional indicator is unavailable.
#[cfg(test)]
pub fn test_snapshot(close: f64, lower: f64, mean: f64) -> crate::indicators::IndicatorSnapshot {
    use crate::config::StdDevKind;
    use crate::indicators::{BandState, IndicatorSnapshot};
    let std_dev = (mean - lower) / 2.0;
    IndicatorSnapshot {
        symbol: "TEST".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        close,
        volume: 1_000,
        band: BandState {
            period: 20,
            k: 2.0,
            std_dev_kind: StdDevKind::Population,
            mean,
            std_dev,
            upper: mean + 2.0 * std_dev,
            lower,
        },
        prev_close: None,
        prev_band: None,
        rsi: None,
        recent_rsi: Vec::new(),
        macd: None,
        prev_macd_histogram: None,
        volume_ratio: None,
        price_momentum: None,
    }
}
