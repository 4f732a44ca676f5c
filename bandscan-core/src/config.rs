//! Screening configuration.
//!
//! `ScreenConfig` is built once per run, validated with [`ScreenConfig::validate`],
//! and then passed by reference into every component. Every field has a default so
//! partial TOML/JSON documents deserialize cleanly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConfigHash;

/// Tolerance used when checking that the score weights sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Largest band or volume window. Keeps fixed-point window sums inside `i128`.
pub const MAX_WINDOW: usize = 10_000;

/// Fewest closes the risk metrics accept: two returns for a sample deviation.
pub const MIN_METRICS_WINDOW: usize = 3;

/// Configuration errors. Always fatal at run start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1 (got {value})")]
    NonPositivePeriod { name: &'static str, value: usize },

    #[error("{name} must be <= {max} (got {value})")]
    WindowTooLarge {
        name: &'static str,
        value: usize,
        max: usize,
    },

    #[error("risk.metrics_window must be >= 3 (got {0})")]
    MetricsWindowTooShort(usize),

    #[error("macd_fast ({fast}) must be smaller than macd_slow ({slow})")]
    MacdPeriodsOutOfOrder { fast: usize, slow: usize },

    #[error("sample standard deviation needs band_period >= 2 (got {0})")]
    SamplePeriodTooShort(usize),

    #[error("{name} must be finite and >= {min} (got {value})")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        min: f64,
    },

    #[error("volume_saturation_ratio must be > 1.0 (got {0})")]
    VolumeSaturationTooLow(f64),

    #[error("weight {name} must be finite and non-negative (got {value})")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("score weights must sum to 1.0 (got {0})")]
    WeightsDoNotSumToOne(f64),

    #[error("min_price ({min}) exceeds max_price ({max})")]
    PriceRangeInverted { min: f64, max: f64 },

    #[error("top_k must be >= 1 when set")]
    ZeroTopK,

    #[error("max_history_bars ({budget}) must cover the gating window plus the previous bar ({required})")]
    HistoryBudgetTooSmall { budget: usize, required: usize },
}

/// Which standard deviation the Bollinger Bands use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevKind {
    /// Divide by N.
    #[default]
    Population,
    /// Divide by N - 1.
    Sample,
}

/// Named weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub band_weight: f64,
    pub volume_weight: f64,
    pub momentum_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            band_weight: 0.5,
            volume_weight: 0.25,
            momentum_weight: 0.25,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.band_weight + self.volume_weight + self.momentum_weight
    }
}

/// How the suggested stop-loss level is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopLossRule {
    /// Fixed fraction below the close.
    FixedPercent { pct: f64 },

    /// Fraction below the lower band, or below the close when the close is under the band.
    BelowLowerBand { buffer_pct: f64 },

    /// Fraction below the close chosen by the candidate's risk level.
    RiskTiered { low: f64, medium: f64, high: f64 },
}

impl Default for StopLossRule {
    fn default() -> Self {
        StopLossRule::FixedPercent { pct: 0.08 }
    }
}

/// Risk manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Maximum band width / mean before a candidate is rejected.
    pub volatility_ceiling: f64,
    pub stop_loss: StopLossRule,
    /// When true, candidates whose stop distance exceeds `max_stop_distance` are rejected.
    pub hard_risk_gate: bool,
    pub max_stop_distance: f64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Position size suggested for a score of 1.0 (fraction of capital).
    pub max_position_ratio: f64,
    /// Annual risk-free rate used by the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Trailing closes used for volatility, drawdown, Sharpe and VaR.
    pub metrics_window: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            volatility_ceiling: 0.25,
            stop_loss: StopLossRule::default(),
            hard_risk_gate: false,
            max_stop_distance: 0.15,
            min_price: None,
            max_price: None,
            max_position_ratio: 0.1,
            risk_free_rate: 0.03,
            metrics_window: 252,
        }
    }
}

/// Complete, immutable configuration of one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub band_period: usize,
    pub band_k: f64,
    pub std_dev_kind: StdDevKind,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_window: usize,
    pub volume_ratio_threshold: f64,
    /// Volume ratio at which the volume sub-score saturates at 1.0.
    pub volume_saturation_ratio: f64,
    /// Relative tolerance ε of the oversold touch: close <= lower * (1 + ε).
    pub lower_band_tolerance: f64,
    /// Relative distance above the lower band still counted as a touch.
    pub at_lower_tolerance: f64,
    /// Number of consecutive RSI increases for a full RSI momentum component.
    pub momentum_lookback: usize,
    /// Bars used for the close-to-close price momentum.
    pub momentum_period: usize,
    /// Price momentum above this counts as a confirmation for the risk level.
    pub momentum_confirmation: f64,
    pub weights: ScoreWeights,
    pub risk: RiskConfig,
    pub min_score: f64,
    pub top_k: Option<usize>,
    /// Per-symbol computation budget: only the trailing bars are considered.
    pub max_history_bars: Option<usize>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            band_period: 20,
            band_k: 2.0,
            std_dev_kind: StdDevKind::Population,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volume_window: 20,
            volume_ratio_threshold: 1.2,
            volume_saturation_ratio: 2.0,
            lower_band_tolerance: 0.0,
            at_lower_tolerance: 0.01,
            momentum_lookback: 2,
            momentum_period: 5,
            momentum_confirmation: 0.02,
            weights: ScoreWeights::default(),
            risk: RiskConfig::default(),
            min_score: 0.0,
            top_k: None,
            max_history_bars: None,
        }
    }
}

impl ScreenConfig {
    /// Validate every parameter. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("band_period", self.band_period),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("volume_window", self.volume_window),
            ("momentum_lookback", self.momentum_lookback),
            ("momentum_period", self.momentum_period),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositivePeriod { name, value });
            }
        }

        for (name, value) in [
            ("band_period", self.band_period),
            ("volume_window", self.volume_window),
        ] {
            if value > MAX_WINDOW {
                return Err(ConfigError::WindowTooLarge {
                    name,
                    value,
                    max: MAX_WINDOW,
                });
            }
        }

        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdPeriodsOutOfOrder {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }

        if self.std_dev_kind == StdDevKind::Sample && self.band_period < 2 {
            return Err(ConfigError::SamplePeriodTooShort(self.band_period));
        }

        check_threshold("band_k", self.band_k, 0.0)?;
        check_threshold("volume_ratio_threshold", self.volume_ratio_threshold, 0.0)?;
        check_threshold("lower_band_tolerance", self.lower_band_tolerance, 0.0)?;
        check_threshold("at_lower_tolerance", self.at_lower_tolerance, 0.0)?;
        check_threshold("momentum_confirmation", self.momentum_confirmation, 0.0)?;
        check_threshold("min_score", self.min_score, 0.0)?;
        check_threshold("volatility_ceiling", self.risk.volatility_ceiling, 0.0)?;
        check_threshold("max_stop_distance", self.risk.max_stop_distance, 0.0)?;
        check_threshold("max_position_ratio", self.risk.max_position_ratio, 0.0)?;
        check_threshold("risk_free_rate", self.risk.risk_free_rate, -1.0)?;
        if self.risk.metrics_window < MIN_METRICS_WINDOW {
            return Err(ConfigError::MetricsWindowTooShort(self.risk.metrics_window));
        }
        self.validate_stop_loss()?;

        if !(self.volume_saturation_ratio.is_finite() && self.volume_saturation_ratio > 1.0) {
            return Err(ConfigError::VolumeSaturationTooLow(
                self.volume_saturation_ratio,
            ));
        }

        for (name, value) in [
            ("band_weight", self.weights.band_weight),
            ("volume_weight", self.weights.volume_weight),
            ("momentum_weight", self.weights.momentum_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne(sum));
        }

        if let Some(min) = self.risk.min_price {
            check_threshold("min_price", min, 0.0)?;
        }
        if let Some(max) = self.risk.max_price {
            check_threshold("max_price", max, 0.0)?;
        }
        if let (Some(min), Some(max)) = (self.risk.min_price, self.risk.max_price) {
            if min > max {
                return Err(ConfigError::PriceRangeInverted { min, max });
            }
        }

        if self.top_k == Some(0) {
            return Err(ConfigError::ZeroTopK);
        }

        // The snapshot also needs the bar before the evaluation date for `prev_band`
        if let Some(budget) = self.max_history_bars {
            let required = self.gating_window() + 1;
            if budget < required {
                return Err(ConfigError::HistoryBudgetTooSmall { budget, required });
            }
        }

        Ok(())
    }

    /// Bars needed before a symbol can be screened at all.
    ///
    /// RSI and MACD are confirmations only, so their warmup does not count.
    pub fn gating_window(&self) -> usize {
        self.band_period.max(self.volume_window)
    }

    /// BLAKE3 hash of the canonical JSON form.
    pub fn config_hash(&self) -> ConfigHash {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigHash::from_bytes(json.as_bytes())
    }

    fn validate_stop_loss(&self) -> Result<(), ConfigError> {
        match self.risk.stop_loss {
            StopLossRule::FixedPercent { pct } => check_fraction("stop_loss.pct", pct),
            StopLossRule::BelowLowerBand { buffer_pct } => {
                check_fraction("stop_loss.buffer_pct", buffer_pct)
            }
            StopLossRule::RiskTiered { low, medium, high } => {
                check_fraction("stop_loss.low", low)?;
                check_fraction("stop_loss.medium", medium)?;
                check_fraction("stop_loss.high", high)
            }
        }
    }
}

fn check_threshold(name: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value, min })
    }
}

/// Stop fractions must lie in (0, 1) so the stop stays strictly between 0 and the close.
fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold {
            name,
            value,
            min: 0.0,
        })
    }
}
