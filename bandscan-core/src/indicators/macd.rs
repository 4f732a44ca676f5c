//! MACD: difference of two EMAs plus a signal EMA.
//!
//! line = EMA(close, fast) - EMA(close, slow), available from index slow-1.
//! signal = EMA(line, signal_period), seeded with the SMA of the first
//! `signal_period` line values; available from index slow-1 + signal_period-1.
//! histogram = line - signal.

use serde::{Deserialize, Serialize};

use super::ema::{ema_of_series, EmaTracker};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Batch MACD over a close series.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<MacdValue>> {
    let n = closes.len();
    let mut result = vec![None; n];
    if slow == 0 || n < slow {
        return result;
    }

    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);

    let start = slow - 1;
    let line: Vec<f64> = (start..n)
        .filter_map(|i| Some(fast_ema[i]? - slow_ema[i]?))
        .collect();
    let signal_ema = ema_of_series(&line, signal);

    for (offset, sig) in signal_ema.into_iter().enumerate() {
        if let Some(sig) = sig {
            let l = line[offset];
            result[start + offset] = Some(MacdValue {
                line: l,
                signal: sig,
                histogram: l - sig,
            });
        }
    }
    result
}

/// Incremental MACD built from three [`EmaTracker`]s.
#[derive(Debug, Clone)]
pub struct MacdTracker {
    fast: EmaTracker,
    slow: EmaTracker,
    signal: EmaTracker,
    current: Option<MacdValue>,
}

impl MacdTracker {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast: EmaTracker::new(fast),
            slow: EmaTracker::new(slow),
            signal: EmaTracker::new(signal),
            current: None,
        }
    }

    pub fn push(&mut self, close: f64) -> Option<MacdValue> {
        let fast = self.fast.push(close);
        let slow = self.slow.push(close);
        if let (Some(f), Some(s)) = (fast, slow) {
            let line = f - s;
            if let Some(sig) = self.signal.push(line) {
                self.current = Some(MacdValue {
                    line,
                    signal: sig,
                    histogram: line - sig,
                });
            }
        }
        self.current
    }

    pub fn current(&self) -> Option<MacdValue> {
        self.current
    }
}
