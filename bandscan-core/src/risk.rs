//! RiskManager: rejects or annotates scored candidates.
//!
//! Checks run in order: volatility ceiling, price range, then the stop-loss
//! distance when the hard gate is on. Survivors get a [`RiskAnnotation`] with the
//! stop, the target (band mean), reward/risk, risk level, holding period, a
//! suggested position and [`RiskMetrics`] over the trailing closes.

use serde::{Deserialize, Serialize};

use crate::config::{RiskConfig, StopLossRule};
use crate::domain::{PriceBar, Symbol};
use crate::metrics::RiskMetrics;
use crate::screening::{ScreeningCandidate, SignalType};

/// Risk level from the number of risk factors that held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Two or more: low, one: medium, none: high.
    pub fn from_confirmations(count: usize) -> Self {
        match count {
            0 => RiskLevel::High,
            1 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Expected holding period for the reversion to play out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingPeriod {
    Short,
    Medium,
    Long,
}

impl HoldingPeriod {
    /// Deep oversold: long, rebound under way: medium, near the band: short.
    pub fn from_signal(signal: SignalType) -> Self {
        match signal {
            SignalType::BelowLower => HoldingPeriod::Long,
            SignalType::Rebounding => HoldingPeriod::Medium,
            SignalType::AtLower | SignalType::None => HoldingPeriod::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAnnotation {
    pub stop_loss: f64,
    /// (close - stop_loss) / close
    pub stop_distance: f64,
    pub target_price: f64,
    /// (target - close) / (close - stop_loss)
    pub reward_risk: f64,
    pub risk_level: RiskLevel,
    /// Fraction of capital.
    pub suggested_position: f64,
    pub width_ratio: f64,
    pub holding_period: HoldingPeriod,
    /// `None` with fewer than three closes of history.
    pub metrics: Option<RiskMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    VolatilityCeiling { width_ratio: f64, ceiling: f64 },
    PriceOutOfRange {
        close: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    StopTooWide { stop_distance: f64, max: f64 },
}

/// A candidate removed by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRejection {
    pub symbol: Symbol,
    pub score: f64,
    #[serde(flatten)]
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Accepted(RiskAnnotation),
    Rejected(RejectReason),
}

/// Stateless across symbols.
#[derive(Debug, Clone, Copy)]
pub struct RiskManager<'a> {
    config: &'a RiskConfig,
}

impl<'a> RiskManager<'a> {
    pub fn new(config: &'a RiskConfig) -> Self {
        Self { config }
    }

    /// `history` holds the candidate's bars up to and including its date.
    /// Metrics use the trailing `metrics_window` closes of it.
    pub fn assess(&self, candidate: &ScreeningCandidate, history: &[PriceBar]) -> RiskDecision {
        let cfg = self.config;
        let close = candidate.close;
        let band = &candidate.band;

        let width_ratio = band.width_ratio();
        if width_ratio > cfg.volatility_ceiling {
            return RiskDecision::Rejected(RejectReason::VolatilityCeiling {
                width_ratio,
                ceiling: cfg.volatility_ceiling,
            });
        }

        let below_min = cfg.min_price.is_some_and(|min| close < min);
        let above_max = cfg.max_price.is_some_and(|max| close > max);
        if below_min || above_max {
            return RiskDecision::Rejected(RejectReason::PriceOutOfRange {
                close,
                min: cfg.min_price,
                max: cfg.max_price,
            });
        }

        let risk_level = RiskLevel::from_confirmations(candidate.confirmations.risk_factors());
        let stop_loss = stop_price(&cfg.stop_loss, close, band.lower, risk_level);
        let stop_distance = (close - stop_loss) / close;
        if cfg.hard_risk_gate && stop_distance > cfg.max_stop_distance {
            return RiskDecision::Rejected(RejectReason::StopTooWide {
                stop_distance,
                max: cfg.max_stop_distance,
            });
        }

        let target_price = band.mean;
        let tail = &history[history.len().saturating_sub(cfg.metrics_window)..];
        let closes: Vec<f64> = tail.iter().map(|b| b.close).collect();
        RiskDecision::Accepted(RiskAnnotation {
            stop_loss,
            stop_distance,
            target_price,
            reward_risk: (target_price - close) / (close - stop_loss),
            risk_level,
            suggested_position: cfg.max_position_ratio * candidate.score,
            width_ratio,
            holding_period: HoldingPeriod::from_signal(candidate.signal),
            metrics: RiskMetrics::compute(&closes, cfg.risk_free_rate),
        })
    }

    /// Attach the annotation, or return the rejection.
    pub fn apply(
        &self,
        mut candidate: ScreeningCandidate,
        history: &[PriceBar],
    ) -> Result<ScreeningCandidate, RiskRejection> {
        match self.assess(&candidate, history) {
            RiskDecision::Accepted(annotation) => {
                candidate.risk = Some(annotation);
                Ok(candidate)
            }
            RiskDecision::Rejected(reason) => Err(RiskRejection {
                symbol: candidate.symbol,
                score: candidate.score,
                reason,
            }),
        }
    }
}

/// Stop level for `rule`. Always strictly below `close` for a validated rule.
pub fn stop_price(rule: &StopLossRule, close: f64, lower: f64, level: RiskLevel) -> f64 {
    match *rule {
        StopLossRule::FixedPercent { pct } => close * (1.0 - pct),
        StopLossRule::BelowLowerBand { buffer_pct } => close.min(lower) * (1.0 - buffer_pct),
        StopLossRule::RiskTiered { low, medium, high } => {
            let pct = match level {
                RiskLevel::Low => low,
                RiskLevel::Medium => medium,
                RiskLevel::High => high,
            };
            close * (1.0 - pct)
        }
    }
}
