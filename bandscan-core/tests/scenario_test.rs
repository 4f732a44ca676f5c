//! End-to-end screening scenarios over synthetic series:
//! indicator snapshot → rule chain → risk manager → ranking.

use bandscan_core::domain::{DatasetHash, PriceBar, PriceSeries};
use bandscan_core::indicators::{IndicatorEngine, SymbolError};
use bandscan_core::ranking::RankingAssembler;
use bandscan_core::risk::{HoldingPeriod, RiskManager};
use bandscan_core::screening::{ScreeningEngine, SignalType};
use bandscan_core::{ConfigError, ScreenConfig};
use chrono::NaiveDate;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn series(symbol: &str, closes: &[f64], volumes: &[u64]) -> PriceSeries {
    let bars = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            PriceBar::new(
                base_date() + chrono::Duration::days(i as i64),
                close,
                close + 1.0,
                close - 1.0,
                close,
                volume,
            )
        })
        .collect();
    PriceSeries::new(symbol, bars)
}

/// 20 days at 100, a drop to 90, then a recovery to 96 on rising volume.
fn drop_and_rebound() -> PriceSeries {
    let mut closes = vec![100.0; 20];
    closes.extend([90.0, 96.0]);
    let mut volumes = vec![1_000; 20];
    volumes.extend([500, 1_500]);
    series("DIP", &closes, &volumes)
}

#[test]
fn drop_below_band_then_rebound() {
    let cfg = ScreenConfig::default();
    let indicators = IndicatorEngine::new(&cfg);
    let screening = ScreeningEngine::new(&cfg);
    let s = drop_and_rebound();

    let day21 = indicators.snapshot(&s, s.bars[20].date).unwrap();
    // window: 19 x 100 and 90 → mean 99.5, lower ≈ 95.14
    assert!(day21.close < day21.band.lower);
    assert_eq!(screening.classify(&day21), SignalType::BelowLower);

    let day22 = indicators.snapshot(&s, s.bars[21].date).unwrap();
    // window: 18 x 100, 90, 96 → mean 99.3, lower ≈ 94.69
    assert!((day22.band.mean - 99.3).abs() < 1e-9);
    assert!(day22.close > day22.band.lower && day22.close < day22.band.mean);
    assert_eq!(day22.volume_ratio, Some(1.5));

    let candidate = screening.evaluate(&day22).unwrap();
    assert_eq!(candidate.signal, SignalType::Rebounding);
    assert_eq!(candidate.rule, "rebound_in_progress");
    assert!((candidate.sub_scores.volume - 0.5).abs() < 1e-12);
    assert!(candidate.confirmations.volume);
    assert!(candidate.score > 0.0 && candidate.score <= 1.0);
}

#[test]
fn rebound_without_volume_is_not_flagged() {
    let cfg = ScreenConfig::default();
    let mut closes = vec![100.0; 20];
    closes.extend([90.0, 96.0]);
    let s = series("DIP", &closes, &[1_000; 22]);
    let snap = IndicatorEngine::new(&cfg)
        .snapshot(&s, s.bars[21].date)
        .unwrap();
    assert_eq!(ScreeningEngine::new(&cfg).classify(&snap), SignalType::None);
}

#[test]
fn flat_history_collapses_band() {
    let cfg = ScreenConfig::default();
    let s = series("FLAT", &[50.0; 25], &[1_000; 25]);
    let snap = IndicatorEngine::new(&cfg)
        .snapshot(&s, s.bars[24].date)
        .unwrap();
    assert_eq!(snap.band.std_dev, 0.0);
    assert_eq!(snap.band.upper, snap.band.mean);
    assert_eq!(snap.band.lower, snap.band.mean);

    let screening = ScreeningEngine::new(&cfg);
    assert_eq!(screening.classify(&snap), SignalType::None);
    assert!(screening.evaluate(&snap).is_none());
}

#[test]
fn smallest_history_budget_still_sees_rebound() {
    let s = drop_and_rebound();
    let date = s.bars[21].date;

    let too_small = ScreenConfig {
        max_history_bars: Some(20),
        ..ScreenConfig::default()
    };
    assert_eq!(
        too_small.validate(),
        Err(ConfigError::HistoryBudgetTooSmall {
            budget: 20,
            required: 21
        })
    );

    let cfg = ScreenConfig {
        max_history_bars: Some(21),
        ..ScreenConfig::default()
    };
    assert!(cfg.validate().is_ok());
    let snap = IndicatorEngine::new(&cfg).snapshot(&s, date).unwrap();
    assert!(snap.prev_band.is_some());
    assert_eq!(
        ScreeningEngine::new(&cfg).classify(&snap),
        SignalType::Rebounding
    );
}

#[test]
fn history_boundary_at_band_period() {
    let cfg = ScreenConfig::default();
    let engine = IndicatorEngine::new(&cfg);

    let short = series("S", &[100.0; 19], &[1_000; 19]);
    assert_eq!(
        engine.snapshot(&short, short.bars[18].date),
        Err(SymbolError::InsufficientHistory {
            required: 20,
            available: 19
        })
    );

    let exact = series("S", &[100.0; 20], &[1_000; 20]);
    assert!(engine.snapshot(&exact, exact.bars[19].date).is_ok());
}

#[test]
fn full_pipeline_ranks_and_annotates() {
    let cfg = ScreenConfig::default();
    let indicators = IndicatorEngine::new(&cfg);
    let screening = ScreeningEngine::new(&cfg);
    let risk = RiskManager::new(&cfg.risk);

    let dip = drop_and_rebound();
    let flat_above = {
        let mut closes = vec![100.0; 21];
        closes.push(101.0);
        series("UP", &closes, &[1_000; 22])
    };
    let short = series("NEW", &[100.0; 5], &[1_000; 5]);
    let date = dip.bars[21].date;
    let short = PriceSeries::new(
        "NEW",
        short
            .bars
            .iter()
            .enumerate()
            .map(|(i, b)| PriceBar {
                date: date - chrono::Duration::days(4 - i as i64),
                ..b.clone()
            })
            .collect(),
    );

    let universe = vec![dip, flat_above, short];
    let mut asm = RankingAssembler::new(&cfg, date, DatasetHash::from_hash("test"), universe.len());
    for s in &universe {
        match indicators.snapshot(s, date) {
            Ok(snap) => match screening.evaluate(&snap) {
                Some(c) => {
                    let history = indicators.history(s, date).unwrap_or_default();
                    match risk.apply(c, history) {
                        Ok(c) => asm.add_candidate(c),
                        Err(r) => asm.add_rejection(r),
                    }
                }
                None => asm.add_no_signal(),
            },
            Err(e) => asm.add_skip(s.symbol.clone(), e),
        }
    }
    let result = asm.finish();

    assert_eq!(result.candidates.len(), 1);
    let top = &result.candidates[0];
    assert_eq!(top.symbol, "DIP");
    let annotation = top.risk.unwrap();
    assert!(annotation.stop_loss < top.close);
    assert_eq!(annotation.target_price, top.band.mean);
    assert_eq!(annotation.holding_period, HoldingPeriod::Medium);
    assert!(annotation.metrics.is_some());
    assert_eq!(result.metadata.counts.no_signal, 1);
    assert_eq!(result.metadata.counts.insufficient_history, 1);
    assert_eq!(result.metadata.skips[0].symbol, "NEW");
}
