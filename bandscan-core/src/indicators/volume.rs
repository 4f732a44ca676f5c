//! Volume ratio: today's volume over the mean volume of the trailing window.
//!
//! The window includes today. A zero mean volume makes the ratio unavailable.
//! Volumes are whole shares, so both paths keep an exact `u128` sum and divide
//! once.

use std::collections::VecDeque;

/// Batch volume ratio at the last element of `volumes`.
pub fn volume_ratio_at(volumes: &[u64], window: usize) -> Option<f64> {
    if window == 0 || volumes.len() < window {
        return None;
    }
    let tail = &volumes[volumes.len() - window..];
    let sum = tail.iter().map(|&v| u128::from(v)).sum();
    ratio_from_sum(*tail.last()?, sum, window)
}

/// Incremental volume ratio.
#[derive(Debug, Clone)]
pub struct VolumeRatioTracker {
    window: usize,
    buf: VecDeque<u64>,
    sum: u128,
    current: Option<f64>,
}

impl VolumeRatioTracker {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume window must be >= 1");
        Self {
            window,
            buf: VecDeque::with_capacity(window),
            sum: 0,
            current: None,
        }
    }

    pub fn push(&mut self, volume: u64) -> Option<f64> {
        if self.buf.len() == self.window {
            if let Some(old) = self.buf.pop_front() {
                self.sum -= u128::from(old);
            }
        }
        self.buf.push_back(volume);
        self.sum += u128::from(volume);
        self.current = if self.buf.len() == self.window {
            ratio_from_sum(volume, self.sum, self.window)
        } else {
            None
        };
        self.current
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}

fn ratio_from_sum(today: u64, sum: u128, window: usize) -> Option<f64> {
    if sum == 0 {
        return None;
    }
    let mean = sum as f64 / window as f64;
    Some(today as f64 / mean)
}
