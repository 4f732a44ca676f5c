//! ScreeningEngine: rule chain plus scoring over one snapshot.

use super::candidate::ScreeningCandidate;
use super::scoring::{Confirmations, SubScores};
use super::signal::{default_chain, first_match, ReversionRule, SignalType};
use crate::config::ScreenConfig;
use crate::indicators::IndicatorSnapshot;

pub struct ScreeningEngine<'a> {
    config: &'a ScreenConfig,
    rules: Vec<Box<dyn ReversionRule>>,
}

impl<'a> ScreeningEngine<'a> {
    pub fn new(config: &'a ScreenConfig) -> Self {
        Self {
            config,
            rules: default_chain(),
        }
    }

    /// Engine over a custom rule chain, evaluated in the given order.
    pub fn with_rules(config: &'a ScreenConfig, rules: Vec<Box<dyn ReversionRule>>) -> Self {
        Self { config, rules }
    }

    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> SignalType {
        first_match(&self.rules, snapshot, self.config).map_or(SignalType::None, |r| r.signal())
    }

    /// Score the snapshot if a rule matches. No match yields no candidate.
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Option<ScreeningCandidate> {
        let rule = first_match(&self.rules, snapshot, self.config)?;
        let signal = rule.signal();
        if !signal.is_candidate() {
            return None;
        }
        let sub_scores = SubScores::compute(snapshot, self.config);
        Some(ScreeningCandidate {
            symbol: snapshot.symbol.clone(),
            date: snapshot.date,
            signal,
            rule: rule.name().to_string(),
            score: sub_scores.composite(&self.config.weights),
            sub_scores,
            confirmations: Confirmations::compute(snapshot, self.config),
            close: snapshot.close,
            band: snapshot.band,
            rsi: snapshot.rsi,
            volume_ratio: snapshot.volume_ratio,
            price_momentum: snapshot.price_momentum,
            risk: None,
        })
    }
}
