use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Symbol not found: '{0}'")]
    SymbolNotFound(String),

    #[error("Empty price series for symbol '{0}'")]
    EmptySeries(String),

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Unknown indicator type: {0}")]
    UnknownIndicator(String),

    #[error("Invalid indicator parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("No cached series for symbol '{symbol}' under key '{key}'")]
    CacheMiss { symbol: String, key: String },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
