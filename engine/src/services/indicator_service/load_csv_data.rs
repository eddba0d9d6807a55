// Handler for loading a daily bar CSV into the shared store
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::settings::EngineSettings;
use crate::data::csv_parser::DailyCsvParser;
use crate::data::market_data::MarketDataStore;
use crate::error::{EngineError, Result};
use crate::indicators::IndicatorEngine;
use crate::services::{LoadCsvRequest, LoadCsvResponse};
use shared::utils::normalize_trade_date;

pub async fn handle_load_csv_data(
    req_payload: LoadCsvRequest,
    engine: Arc<RwLock<IndicatorEngine<MarketDataStore>>>,
    settings: &EngineSettings,
) -> Result<LoadCsvResponse> {
    let path = req_payload.file_path.clone();
    let delimiter = settings.delimiter_byte();
    let mut bars = tokio::task::spawn_blocking(move || DailyCsvParser::load_bars_from_csv(path, delimiter))
        .await
        .map_err(|e| EngineError::ProcessingError(format!("CSV loading task failed: {}", e)))??;

    if let Some(start_date) = &settings.start_date {
        let start_date =
            normalize_trade_date(start_date).map_err(|_| EngineError::InvalidDate(start_date.clone()))?;
        let before = bars.len();
        // Unparseable dates are kept so that the store reports them.
        bars.retain(|bar| normalize_trade_date(&bar.date).map_or(true, |date| date >= start_date));
        tracing::debug!(
            symbol = %req_payload.symbol,
            dropped = before - bars.len(),
            start_date = %start_date,
            "Filtered bars before start date"
        );
    }

    let mut engine = engine.write().await;
    let bars_loaded = engine.store_mut().add_bars(&req_payload.symbol, bars)?;
    let total_bars = engine.store().len_of(&req_payload.symbol);

    Ok(LoadCsvResponse {
        success: true,
        message: format!(
            "Loaded {} bars for symbol {} ({} total)",
            bars_loaded, req_payload.symbol, total_bars
        ),
        bars_loaded,
        total_bars,
    })
}
