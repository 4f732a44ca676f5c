//! Reversion rule chain.
//!
//! Rules are evaluated in a fixed order and the first match decides the
//! [`SignalType`]: oversold touch, then rebound in progress, then near-lower touch.
//! A collapsed band (upper <= lower) has no oversold side, so no rule runs.

use serde::{Deserialize, Serialize};

use crate::config::ScreenConfig;
use crate::indicators::IndicatorSnapshot;

/// Verdict of the rule chain for one symbol on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    /// Close at or below the lower band.
    BelowLower,
    /// Between the lower band and the mean, moving away from the lower band on volume.
    Rebounding,
    /// Within `at_lower_tolerance` above the lower band.
    AtLower,
    /// No rule matched; never emitted as a candidate.
    None,
}

impl SignalType {
    pub fn is_candidate(self) -> bool {
        self != SignalType::None
    }
}

/// One predicate of the reversion chain.
///
/// Rules only see the indicator snapshot and the configuration.
pub trait ReversionRule: Send + Sync {
    fn name(&self) -> &str;

    /// Signal produced when the rule matches.
    fn signal(&self) -> SignalType;

    fn matches(&self, snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> bool;
}

/// close <= lower * (1 + lower_band_tolerance)
#[derive(Debug, Clone, Copy, Default)]
pub struct OversoldTouch;

impl ReversionRule for OversoldTouch {
    fn name(&self) -> &str {
        "oversold_touch"
    }

    fn signal(&self) -> SignalType {
        SignalType::BelowLower
    }

    fn matches(&self, snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> bool {
        snapshot.close <= snapshot.band.lower * (1.0 + config.lower_band_tolerance)
    }
}

/// lower < close < mean, distance to the lower band not shrinking since the
/// previous bar, and the volume ratio at or above the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReboundInProgress;

impl ReversionRule for ReboundInProgress {
    fn name(&self) -> &str {
        "rebound_in_progress"
    }

    fn signal(&self) -> SignalType {
        SignalType::Rebounding
    }

    fn matches(&self, snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> bool {
        let band = &snapshot.band;
        if !(band.lower < snapshot.close && snapshot.close < band.mean) {
            return false;
        }
        let (Some(prev_close), Some(prev_band)) = (snapshot.prev_close, snapshot.prev_band)
        else {
            return false;
        };
        if prev_band.distance_to_lower(prev_close) > band.distance_to_lower(snapshot.close) {
            return false;
        }
        volume_confirmed(snapshot, config)
    }
}

/// close <= lower * (1 + at_lower_tolerance)
#[derive(Debug, Clone, Copy, Default)]
pub struct NearLowerTouch;

impl ReversionRule for NearLowerTouch {
    fn name(&self) -> &str {
        "near_lower_touch"
    }

    fn signal(&self) -> SignalType {
        SignalType::AtLower
    }

    fn matches(&self, snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> bool {
        snapshot.close <= snapshot.band.lower * (1.0 + config.at_lower_tolerance)
    }
}

/// Volume ratio available and at or above `volume_ratio_threshold`.
pub fn volume_confirmed(snapshot: &IndicatorSnapshot, config: &ScreenConfig) -> bool {
    snapshot
        .volume_ratio
        .is_some_and(|ratio| ratio >= config.volume_ratio_threshold)
}

/// The rules in precedence order.
pub fn default_chain() -> Vec<Box<dyn ReversionRule>> {
    vec![
        Box::new(OversoldTouch),
        Box::new(ReboundInProgress),
        Box::new(NearLowerTouch),
    ]
}

/// First rule that matches, or `None` when nothing matches or the band has collapsed.
pub fn first_match<'r>(
    rules: &'r [Box<dyn ReversionRule>],
    snapshot: &IndicatorSnapshot,
    config: &ScreenConfig,
) -> Option<&'r dyn ReversionRule> {
    if snapshot.band.upper <= snapshot.band.lower {
        return None;
    }
    rules
        .iter()
        .find(|rule| rule.matches(snapshot, config))
        .map(|rule| rule.as_ref())
}

/// First matching rule's signal, or `SignalType::None`.
pub fn classify(
    rules: &[Box<dyn ReversionRule>],
    snapshot: &IndicatorSnapshot,
    config: &ScreenConfig,
) -> SignalType {
    first_match(rules, snapshot, config).map_or(SignalType::None, |rule| rule.signal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::test_snapshot;

    #[test]
    fn close_on_lower_band_is_below_lower() {
        let cfg = ScreenConfig::default();
        let snap = test_snapshot(95.0, 95.0, 100.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::BelowLower);
    }

    #[test]
    fn tolerance_widens_oversold_touch() {
        let cfg = ScreenConfig {
            lower_band_tolerance: 0.01,
            ..Default::default()
        };
        let snap = test_snapshot(95.5, 95.0, 100.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::BelowLower);
    }

    #[test]
    fn rebound_needs_volume() {
        let cfg = ScreenConfig::default();
        let mut snap = test_snapshot(97.0, 95.0, 100.0);
        snap.prev_close = Some(94.0);
        snap.prev_band = Some(snap.band);
        snap.volume_ratio = Some(1.1);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);

        snap.volume_ratio = Some(1.2);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::Rebounding);
    }

    #[test]
    fn rebound_needs_previous_band() {
        let cfg = ScreenConfig::default();
        let mut snap = test_snapshot(97.0, 95.0, 100.0);
        snap.prev_close = Some(94.0);
        snap.volume_ratio = Some(2.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);
    }

    #[test]
    fn shrinking_distance_is_not_a_rebound() {
        let cfg = ScreenConfig::default();
        let mut snap = test_snapshot(97.0, 95.0, 100.0);
        snap.prev_close = Some(98.0);
        snap.prev_band = Some(snap.band);
        snap.volume_ratio = Some(2.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);
    }

    #[test]
    fn near_lower_without_rebound_is_at_lower() {
        let cfg = ScreenConfig::default();
        // 95.5 <= 95 * 1.01 = 95.95
        let snap = test_snapshot(95.5, 95.0, 100.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::AtLower);
    }

    #[test]
    fn rebound_takes_precedence_over_at_lower() {
        let cfg = ScreenConfig::default();
        let mut snap = test_snapshot(95.5, 95.0, 100.0);
        snap.prev_close = Some(94.0);
        snap.prev_band = Some(snap.band);
        snap.volume_ratio = Some(1.5);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::Rebounding);
    }

    #[test]
    fn collapsed_band_is_none() {
        let cfg = ScreenConfig::default();
        let snap = test_snapshot(100.0, 100.0, 100.0);
        assert_eq!(snap.band.upper, snap.band.lower);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);
        assert!(first_match(&default_chain(), &snap, &cfg).is_none());
    }

    #[test]
    fn first_match_names_the_deciding_rule() {
        let cfg = ScreenConfig::default();
        let chain = default_chain();
        let below = test_snapshot(94.0, 95.0, 100.0);
        assert_eq!(
            first_match(&chain, &below, &cfg).map(|r| r.name()),
            Some("oversold_touch")
        );
        let near = test_snapshot(95.5, 95.0, 100.0);
        assert_eq!(
            first_match(&chain, &near, &cfg).map(|r| r.name()),
            Some("near_lower_touch")
        );
    }

    /// A rule that flags every close above the mean.
    struct AboveMean;

    impl ReversionRule for AboveMean {
        fn name(&self) -> &str {
            "above_mean"
        }

        fn signal(&self) -> SignalType {
            SignalType::AtLower
        }

        fn matches(&self, snapshot: &IndicatorSnapshot, _config: &ScreenConfig) -> bool {
            snapshot.close > snapshot.band.mean
        }
    }

    #[test]
    fn custom_rule_runs_through_the_chain() {
        let cfg = ScreenConfig::default();
        let chain: Vec<Box<dyn ReversionRule>> = vec![Box::new(AboveMean)];
        let snap = test_snapshot(101.0, 95.0, 100.0);
        assert_eq!(classify(&chain, &snap, &cfg), SignalType::AtLower);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);
    }

    #[test]
    fn above_mean_is_none() {
        let cfg = ScreenConfig::default();
        let snap = test_snapshot(101.0, 95.0, 100.0);
        assert_eq!(classify(&default_chain(), &snap, &cfg), SignalType::None);
        assert!(!SignalType::None.is_candidate());
    }
}
