// Service layer: request/response payloads and the shared indicator service
use serde::{Deserialize, Serialize};
use shared::models::IndicatorReading;

pub mod indicator_service;

pub use indicator_service::IndicatorService;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCsvRequest {
    pub file_path: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCsvResponse {
    pub success: bool,
    pub message: String,
    /// Rows newly added to the symbol's series.
    pub bars_loaded: usize,
    pub total_bars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub symbol: String,
    pub indicator_type: String,
    /// Empty means the symbol's latest trading date.
    #[serde(default)]
    pub date: String,
    /// JSON object, e.g. `{"period": 5}`. Empty uses the configured defaults.
    #[serde(default)]
    pub parameters: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorResponse {
    pub indicator_name: String,
    pub value: Option<f64>,
    pub reading: IndicatorReading,
}
