//! Bandscan Runner: screening orchestration around `bandscan-core`.
//!
//! This crate provides:
//! - TOML configuration files (`[screen]` and `[data]` tables)
//! - CSV price loading from a local directory, with per-file failures
//! - Parallel single-date universe screening with structured skip logging
//! - Opportunity scans over a date range using the incremental indicator path

pub mod config;
pub mod data_loader;
pub mod opportunities;
pub mod screener;

pub use config::{ConfigFileError, DataSection, ScreenFile};
pub use data_loader::{load_directory, load_series_file, parse_series, LoadError, LoadFailure, LoadedUniverse};
pub use opportunities::{scan_opportunities, DateRange, OpportunityReport};
pub use screener::{latest_date, screen_loaded, screen_symbol, screen_universe, RunError, SymbolOutcome};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn outcome_types_are_send_sync() {
        assert_send::<SymbolOutcome>();
        assert_sync::<SymbolOutcome>();
        assert_send::<OpportunityReport>();
        assert_sync::<OpportunityReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScreenFile>();
        assert_sync::<ScreenFile>();
        assert_send::<LoadedUniverse>();
        assert_sync::<LoadedUniverse>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<ConfigFileError>();
        assert_sync::<ConfigFileError>();
    }
}
