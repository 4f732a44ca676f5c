//! Screen configuration files.
//!
//! A TOML document with a `[screen]` table (any subset of `ScreenConfig` fields)
//! and an optional `[data]` table naming the CSV directory and the symbols to load.
//!
//! ```toml
//! [screen]
//! band_period = 20
//! volume_ratio_threshold = 1.5
//!
//! [screen.risk.stop_loss]
//! type = "BELOW_LOWER_BAND"
//! buffer_pct = 0.02
//!
//! [data]
//! dir = "data/daily"
//! symbols = ["AAPL", "MSFT"]
//! ```

use std::path::{Path, PathBuf};

use bandscan_core::{ConfigError, ScreenConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid screen config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Where the price files live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub dir: Option<PathBuf>,
    /// Empty means every `*.csv` file in `dir`.
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenFile {
    pub screen: ScreenConfig,
    pub data: DataSection,
}

impl ScreenFile {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        let file: ScreenFile = toml::from_str(content)?;
        file.screen.validate()?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandscan_core::StopLossRule;

    #[test]
    fn empty_document_is_default() {
        let file = ScreenFile::from_toml("").unwrap();
        assert_eq!(file.screen, ScreenConfig::default());
        assert!(file.data.dir.is_none());
    }

    #[test]
    fn partial_screen_table() {
        let file = ScreenFile::from_toml(
            r#"
            [screen]
            band_period = 10
            volume_window = 10
            std_dev_kind = "sample"
            top_k = 5

            [screen.risk]
            hard_risk_gate = true

            [screen.risk.stop_loss]
            type = "RISK_TIERED"
            low = 0.05
            medium = 0.08
            high = 0.12

            [data]
            dir = "prices"
            symbols = ["AAA", "BBB"]
            "#,
        )
        .unwrap();
        assert_eq!(file.screen.band_period, 10);
        assert_eq!(file.screen.top_k, Some(5));
        assert!(file.screen.risk.hard_risk_gate);
        assert!(matches!(
            file.screen.risk.stop_loss,
            StopLossRule::RiskTiered { .. }
        ));
        assert_eq!(file.screen.rsi_period, 14);
        assert_eq!(file.data.symbols, ["AAA", "BBB"]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ScreenFile::from_toml("[screen]\nmacd_fast = 30\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::Invalid(ConfigError::MacdPeriodsOutOfOrder { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ScreenFile::from_toml("[screen\nband_period = ").unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScreenFile::from_file(Path::new("/nonexistent/bandscan.toml")).unwrap_err();
        assert!(matches!(err, ConfigFileError::Io { .. }));
    }
}
