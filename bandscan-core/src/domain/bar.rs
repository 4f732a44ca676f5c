//! PriceBar: one trading day of OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest accepted price. Keeps fixed-point window sums inside `i128`.
pub const MAX_PRICE: f64 = 1e9;

/// OHLCV bar for a single symbol on a single day.
///
/// The symbol lives on the owning `PriceSeries`, not on every bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any price field is NaN or infinite.
    pub fn has_non_finite_price(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Price sanity: finite, close strictly positive, no OHLC outside `[0, MAX_PRICE]`.
    pub fn is_sane(&self) -> bool {
        if self.has_non_finite_price() {
            return false;
        }
        self.close > 0.0
            && [self.open, self.high, self.low, self.close]
                .iter()
                .all(|&p| (0.0..=MAX_PRICE).contains(&p))
    }
}
