//! Bandscan Core: Bollinger Band mean-reversion screening engine.
//!
//! Pure computation, no I/O:
//! - Domain types (price bars, series, hashes)
//! - Rolling indicators with batch and incremental paths
//! - Reversion rule chain and composite scoring
//! - Risk manager (volatility ceiling, stops, targets, position size, risk metrics)
//! - Ranking and run metadata

pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod metrics;
pub mod ranking;
pub mod risk;
pub mod screening;

pub use config::{ConfigError, RiskConfig, ScoreWeights, ScreenConfig, StdDevKind, StopLossRule};
pub use domain::{PriceBar, PriceSeries, SeriesError, Symbol};
pub use indicators::{IndicatorEngine, IndicatorSnapshot, SymbolError};
pub use ranking::{RankingAssembler, ScreeningResult};
pub use metrics::RiskMetrics;
pub use risk::RiskManager;
pub use screening::{ScreeningCandidate, ScreeningEngine, SignalType};
