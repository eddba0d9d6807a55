// Engine settings, loaded from a JSON file or falling back to defaults
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

/// How a query date that is absent from a symbol's trading calendar is answered.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NonTradingDatePolicy {
    /// Lower-bound resolution: the next available bar answers (clamped to the ends).
    #[default]
    NextTradingDay,
    /// Dates missing from the index yield "no value".
    NoValue,
}

/// Parameters used when a request does not specify them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IndicatorDefaults {
    pub ma: usize,
    pub macd: (usize, usize, usize),
    pub rsi: usize,
    pub kdj: (usize, usize),
    pub mtm: (usize, usize),
    pub cci: usize,
    pub dmi: usize,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        IndicatorDefaults {
            ma: 5,
            macd: (12, 26, 9),
            rsi: 6,
            kdj: (9, 3),
            mtm: (12, 6),
            cci: 14,
            dmi: 14,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    /// Directory scanned for `<symbol>.csv` files by the binary.
    pub data_dir: PathBuf,
    pub csv_delimiter: char,
    /// Bars dated before this are dropped on load.
    pub start_date: Option<String>,
    pub non_trading_date_policy: NonTradingDatePolicy,
    /// Write computed primary arrays back into the store as derived columns.
    pub write_derived_columns: bool,
    pub snapshot_path: Option<PathBuf>,
    pub indicator_defaults: IndicatorDefaults,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            data_dir: PathBuf::from("data"),
            csv_delimiter: ',',
            start_date: None,
            non_trading_date_policy: NonTradingDatePolicy::default(),
            write_derived_columns: false,
            snapshot_path: None,
            indicator_defaults: IndicatorDefaults::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let settings: EngineSettings = serde_json::from_str(&raw).map_err(|e| {
            EngineError::ConfigError(format!("Invalid settings file '{}': {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.csv_delimiter.is_ascii() {
            return Err(EngineError::ConfigError(format!(
                "CSV delimiter must be a single ASCII character, got '{}'",
                self.csv_delimiter
            )));
        }
        if let Some(start) = &self.start_date {
            shared::utils::parse_trade_date(start).map_err(|e| {
                EngineError::ConfigError(format!("Invalid start_date: {}", e))
            })?;
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.csv_delimiter as u8
    }
}
