//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1)
//! Seed: EMA[period-1] = SMA of the first `period` values.

/// Batch EMA over an arbitrary series. Indices before `period - 1` are `None`.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let mut sum = 0.0;
    for &v in values.iter().take(period) {
        sum += v;
    }
    let seed = sum / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = Some(ema);
        prev = ema;
    }

    result
}

/// Incremental EMA with the same seeding and recurrence as [`ema_of_series`].
#[derive(Debug, Clone)]
pub struct EmaTracker {
    period: usize,
    alpha: f64,
    seen: usize,
    seed_sum: f64,
    current: Option<f64>,
}

impl EmaTracker {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seen: 0,
            seed_sum: 0.0,
            current: None,
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.seen += 1;
        match self.current {
            Some(prev) => {
                self.current = Some(self.alpha * value + (1.0 - self.alpha) * prev);
            }
            None => {
                self.seed_sum += value;
                if self.seen == self.period {
                    self.current = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.current
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}
