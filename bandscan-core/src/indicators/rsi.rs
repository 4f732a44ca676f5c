//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! First value at index `period` (needs `period` close-to-close changes).
//! Edge cases: both averages zero → 50; avg_loss == 0 → 100; avg_gain == 0 → 0.

/// Batch RSI over a close series. Indices before `period` are `None`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(closes.len());
    let n = closes.len();
    if period == 0 || n < period + 1 {
        result.resize(n, None);
        return result;
    }

    // Seed: average gain and average loss over the first `period` changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let ch = closes[i] - closes[i - 1];
        if ch > 0.0 {
            avg_gain += ch;
        } else {
            avg_loss -= ch;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    result.resize(period, None);
    result.push(Some(compute_rsi(avg_gain, avg_loss)));

    // Wilder smoothing for subsequent values
    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let ch = closes[i] - closes[i - 1];
        let gain = if ch > 0.0 { ch } else { 0.0 };
        let loss = if ch < 0.0 { -ch } else { 0.0 };
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result.push(Some(compute_rsi(avg_gain, avg_loss)));
    }

    result
}

/// Incremental RSI. Applies the same recurrences as [`rsi_series`].
#[derive(Debug, Clone)]
pub struct RsiTracker {
    period: usize,
    prev_close: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    current: Option<f64>,
}

impl RsiTracker {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            prev_close: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            current: None,
        }
    }

    pub fn push(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let ch = close - prev;
        self.changes_seen += 1;

        if self.changes_seen <= self.period {
            if ch > 0.0 {
                self.gain_sum += ch;
            } else {
                self.loss_sum -= ch;
            }
            if self.changes_seen == self.period {
                self.avg_gain = self.gain_sum / self.period as f64;
                self.avg_loss = self.loss_sum / self.period as f64;
                self.current = Some(compute_rsi(self.avg_gain, self.avg_loss));
            }
            return self.current;
        }

        let alpha = 1.0 / self.period as f64;
        let gain = if ch > 0.0 { ch } else { 0.0 };
        let loss = if ch < 0.0 { -ch } else { 0.0 };
        self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
        self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
        self.current = Some(compute_rsi(self.avg_gain, self.avg_loss));
        self.current
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
