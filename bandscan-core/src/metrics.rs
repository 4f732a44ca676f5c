//! Per-symbol risk metrics over trailing closes.
//!
//! Returns are simple close-to-close changes. Annualization assumes 252
//! trading days.

use serde::{Deserialize, Serialize};

pub const TRADING_DAYS: f64 = 252.0;

/// Risk statistics attached to every accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized standard deviation of daily returns.
    pub volatility: f64,
    /// Worst peak-to-trough decline as a negative fraction.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// 5th percentile of daily returns.
    pub var_95: f64,
}

impl RiskMetrics {
    /// Metrics over `closes`, oldest first. `None` with fewer than three closes.
    pub fn compute(closes: &[f64], risk_free_rate: f64) -> Option<Self> {
        let returns = daily_returns(closes);
        if returns.len() < 2 {
            return None;
        }
        Some(Self {
            volatility: std_dev(&returns) * TRADING_DAYS.sqrt(),
            max_drawdown: max_drawdown(closes),
            sharpe_ratio: sharpe_ratio(&returns, risk_free_rate),
            var_95: quantile(&returns, 0.05)?,
        })
    }
}

pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if prices never fall below a previous peak.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let Some(&first) = closes.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &close in closes {
        peak = peak.max(close);
        if peak > 0.0 {
            max_dd = max_dd.min((close - peak) / peak);
        }
    }
    max_dd
}

/// (annualized mean return - rf) / annualized volatility. 0.0 when returns are constant.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(returns) * TRADING_DAYS - risk_free_rate) / (std * TRADING_DAYS.sqrt())
}

/// Linearly interpolated quantile, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divides by n - 1).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn max_drawdown_known() {
        let closes = [100.0, 110.0, 90.0, 95.0];
        // Peak 110, trough 90
        assert_approx(max_drawdown(&closes), (90.0 - 110.0) / 110.0, 1e-12);
    }

    #[test]
    fn max_drawdown_rising_is_zero() {
        let closes: Vec<f64> = (0..50).map(|i| 10.0 + i as f64).collect();
        assert_eq!(max_drawdown(&closes), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn quantile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        // pos = 0.05 * 4 = 0.2 → 1 + 0.2 * (2 - 1)
        assert_approx(quantile(&values, 0.05).unwrap(), 1.2, 1e-12);
        assert_eq!(quantile(&[], 0.05), None);
    }

    #[test]
    fn sharpe_constant_returns_is_zero() {
        // Each step +10%, so returns are constant
        let closes = [100.0, 110.0, 121.0, 133.1];
        let returns = daily_returns(&closes);
        assert_eq!(sharpe_ratio(&returns, 0.03), 0.0);
    }

    #[test]
    fn metrics_on_known_series() {
        let closes = [100.0, 102.0, 99.96, 101.9592];
        // returns: +2%, -2%, +2%
        let m = RiskMetrics::compute(&closes, 0.03).unwrap();
        let returns = [0.02, -0.02, 0.02];
        let mean = 0.02 / 3.0;
        let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / 2.0;
        assert_approx(m.volatility, var.sqrt() * 252f64.sqrt(), 1e-9);
        assert_approx(
            m.sharpe_ratio,
            (mean * 252.0 - 0.03) / (var.sqrt() * 252f64.sqrt()),
            1e-9,
        );
        assert_approx(m.max_drawdown, -0.02, 1e-12);
        // pos = 0.05 * 2 = 0.1 → -0.02 + 0.1 * 0.04
        assert_approx(m.var_95, -0.016, 1e-9);
    }

    #[test]
    fn too_few_closes_has_no_metrics() {
        assert!(RiskMetrics::compute(&[100.0, 101.0], 0.03).is_none());
        assert!(RiskMetrics::compute(&[100.0, 101.0, 99.0], 0.03).is_some());
    }
}
