//! Price momentum: percent change of close over `period` bars.

/// close[t] / close[t - period] - 1 at the last element of `closes`.
pub fn momentum_at(closes: &[f64], period: usize) -> Option<f64> {
    let n = closes.len();
    if period == 0 || n <= period {
        return None;
    }
    let base = closes[n - 1 - period];
    if base <= 0.0 {
        return None;
    }
    Some(closes[n - 1] / base - 1.0)
}
