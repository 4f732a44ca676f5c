//! Fixed-capacity rolling window with exact running sums.
//!
//! Values are quantized to fixed point (`PRICE_SCALE` units per 1.0) and the
//! window keeps the integer sum and sum of squares. Integer sums do not depend
//! on the order values were added or removed in, so a window built by sliding
//! and a window summed from scratch hold the same integers, and [`WindowSums`]
//! turns equal integers into bit-identical mean and standard deviation. Each
//! push is O(1) and nothing drifts, so no resync pass is needed.
//!
//! Overflow bound: closes are capped at [`MAX_PRICE`](crate::domain::MAX_PRICE)
//! and windows at [`MAX_WINDOW`](crate::config::MAX_WINDOW), which keeps
//! `n * sum_sq` below `i128::MAX`.

use crate::config::StdDevKind;

/// Fixed-point units per 1.0. Prices resolve to 1e-6.
pub const PRICE_SCALE: f64 = 1e6;

/// `value` in fixed-point units.
pub fn quantize(value: f64) -> i128 {
    (value * PRICE_SCALE).round() as i128
}

/// Exact sums over a window of quantized values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSums {
    pub len: usize,
    pub sum: i128,
    pub sum_sq: i128,
}

impl WindowSums {
    /// Sums over `values`, quantized.
    pub fn of(values: &[f64]) -> Self {
        values.iter().fold(Self::default(), |mut acc, &v| {
            acc.add(quantize(v));
            acc
        })
    }

    fn add(&mut self, q: i128) {
        self.len += 1;
        self.sum += q;
        self.sum_sq += q * q;
    }

    fn remove(&mut self, q: i128) {
        self.len -= 1;
        self.sum -= q;
        self.sum_sq -= q * q;
    }

    /// Mean, or `None` for an empty window.
    pub fn mean(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        Some(self.sum as f64 / (self.len as f64 * PRICE_SCALE))
    }

    /// Sum of squared deviations from the mean. Exactly 0 for a constant window.
    pub fn m2(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let n = self.len as i128;
        // n * Σq² - (Σq)² is n² times the variance, in scaled units; never negative
        let numerator = n * self.sum_sq - self.sum * self.sum;
        numerator as f64 / (self.len as f64 * PRICE_SCALE * PRICE_SCALE)
    }

    pub fn std_dev(&self, kind: StdDevKind) -> Option<f64> {
        std_dev_from_m2(self.m2(), self.len, kind)
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    buf: Vec<i128>,
    capacity: usize,
    /// Index of the oldest value once the buffer is full.
    head: usize,
    sums: WindowSums,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "RollingWindow capacity must be >= 1");
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sums: WindowSums::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Push a value, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        let q = quantize(value);
        if !self.is_full() {
            self.buf.push(q);
            self.sums.add(q);
            return;
        }
        let old = std::mem::replace(&mut self.buf[self.head], q);
        self.head = (self.head + 1) % self.capacity;
        self.sums.remove(old);
        self.sums.add(q);
    }

    pub fn sums(&self) -> WindowSums {
        self.sums
    }

    /// Running mean, or `None` while empty.
    pub fn mean(&self) -> Option<f64> {
        self.sums.mean()
    }

    /// Standard deviation over a full window, or `None` while the window is filling.
    pub fn std_dev(&self, kind: StdDevKind) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.sums.std_dev(kind)
    }
}

/// Standard deviation of a full window from its M2.
pub fn std_dev_from_m2(m2: f64, len: usize, kind: StdDevKind) -> Option<f64> {
    let denom = match kind {
        StdDevKind::Population if len >= 1 => len as f64,
        StdDevKind::Sample if len >= 2 => (len - 1) as f64,
        _ => return None,
    };
    Some((m2 / denom).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn filling_window_has_mean_but_no_std() {
        let mut w = RollingWindow::new(3);
        w.push(10.0);
        w.push(11.0);
        assert_eq!(w.mean(), Some(10.5));
        assert!(w.std_dev(StdDevKind::Population).is_none());
        assert!(!w.is_full());
    }

    #[test]
    fn full_window_moments() {
        let mut w = RollingWindow::new(3);
        for v in [10.0, 11.0, 12.0] {
            w.push(v);
        }
        assert_eq!(w.mean(), Some(11.0));
        // M2 = 1 + 0 + 1
        assert_approx(w.sums().m2(), 2.0, 1e-12);
        assert_approx(
            w.std_dev(StdDevKind::Population).unwrap(),
            (2.0f64 / 3.0).sqrt(),
            1e-12,
        );
        assert_eq!(w.std_dev(StdDevKind::Sample), Some(1.0));
    }

    #[test]
    fn sliding_sums_equal_fresh_sums() {
        let values: Vec<f64> = (0..5_000)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 25.0 + (i % 7) as f64 * 0.01)
            .collect();
        let mut w = RollingWindow::new(20);
        for (i, &v) in values.iter().enumerate() {
            w.push(v);
            if i >= 19 {
                let fresh = WindowSums::of(&values[i - 19..=i]);
                assert_eq!(w.sums(), fresh, "at {i}");
                assert_eq!(w.mean(), fresh.mean());
                assert_eq!(
                    w.std_dev(StdDevKind::Population),
                    fresh.std_dev(StdDevKind::Population)
                );
            }
        }
    }

    #[test]
    fn constant_values_have_exact_zero_std() {
        let mut w = RollingWindow::new(5);
        for _ in 0..12 {
            w.push(100.0);
        }
        assert_eq!(w.mean(), Some(100.0));
        assert_eq!(w.std_dev(StdDevKind::Population), Some(0.0));
    }

    #[test]
    fn flat_tail_after_volatile_prefix_is_exactly_flat() {
        let mut w = RollingWindow::new(4);
        for v in [10.0, 500.0, 3.0, 900.0, 42.17, 42.17, 42.17, 42.17] {
            w.push(v);
        }
        assert_eq!(w.mean(), Some(42.17));
        assert_eq!(w.std_dev(StdDevKind::Population), Some(0.0));
    }

    #[test]
    fn quantize_resolves_micro_units() {
        assert_eq!(quantize(52.43), 52_430_000);
        assert_eq!(quantize(0.000_000_4), 0);
        assert_eq!(quantize(0.000_000_6), 1);
    }

    #[test]
    fn std_dev_from_m2_guards_sample_len() {
        assert!(std_dev_from_m2(0.0, 1, StdDevKind::Sample).is_none());
        assert_eq!(std_dev_from_m2(4.0, 4, StdDevKind::Population), Some(1.0));
    }
}
