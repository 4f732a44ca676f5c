//! ScreeningCandidate: a symbol flagged on a date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scoring::{Confirmations, SubScores};
use super::signal::SignalType;
use crate::domain::Symbol;
use crate::indicators::BandState;
use crate::risk::RiskAnnotation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningCandidate {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub signal: SignalType,
    /// Name of the rule that produced `signal`.
    pub rule: String,
    /// Composite score in [0, 1].
    pub score: f64,
    pub sub_scores: SubScores,
    pub confirmations: Confirmations,
    pub close: f64,
    pub band: BandState,
    pub rsi: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub price_momentum: Option<f64>,
    /// Attached by the risk manager.
    pub risk: Option<RiskAnnotation>,
}
