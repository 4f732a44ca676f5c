//! PriceSeries: ordered daily history for one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PriceBar, Symbol};

/// Structural problems that make a series unusable.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,

    #[error("dates not strictly increasing at index {index}: {previous} then {current}")]
    NonMonotonicDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid prices on {date}: close must be > 0 and all prices finite, non-negative and at most 1e9")]
    InvalidPrice { date: NaiveDate },
}

/// Ordered history of bars for one symbol.
///
/// Constructing a series does not validate it; the runner calls
/// [`PriceSeries::validate`] before any indicator work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<Symbol>, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Check ordering and price sanity. Duplicate dates count as non-monotonic.
    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        for (i, bar) in self.bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::InvalidPrice { date: bar.date });
            }
            if i > 0 {
                let previous = self.bars[i - 1].date;
                if bar.date <= previous {
                    return Err(SeriesError::NonMonotonicDates {
                        index: i,
                        previous,
                        current: bar.date,
                    });
                }
            }
        }
        Ok(())
    }

    /// Index of the bar dated exactly `date`. Requires a validated series.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by(|bar| bar.date.cmp(&date)).ok()
    }

    /// All bars up to and including the bar dated `date`.
    pub fn history_through(&self, date: NaiveDate) -> Option<&[PriceBar]> {
        self.index_of(date).map(|i| &self.bars[..=i])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
