// Handler for point-in-time indicator queries
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::settings::IndicatorDefaults;
use crate::data::market_data::MarketDataStore;
use crate::error::{EngineError, Result};
use crate::indicators::{build_indicator, IndicatorEngine};
use crate::services::{IndicatorRequest, IndicatorResponse};

pub async fn handle_calculate_indicator(
    req_payload: IndicatorRequest,
    engine: Arc<RwLock<IndicatorEngine<MarketDataStore>>>,
    defaults: &IndicatorDefaults,
) -> Result<IndicatorResponse> {
    let raw_params = match req_payload.parameters.trim() {
        "" => "{}",
        raw => raw,
    };
    let params: serde_json::Value = match serde_json::from_str(raw_params) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(
                indicator_type = %req_payload.indicator_type,
                parameters = %req_payload.parameters,
                error_detail = ?e,
                "Invalid JSON parameters for indicator"
            );
            return Err(EngineError::InvalidParameter(format!(
                "Invalid JSON parameters for indicator '{}': {}",
                req_payload.indicator_type, e
            )));
        }
    };
    let calculator = build_indicator(&req_payload.indicator_type, &params, defaults)?;

    // The full-history recompute is CPU-bound: run it on the blocking pool, holding
    // the write lock so cache writes stay serialized.
    let reading = tokio::task::spawn_blocking(move || {
        let mut engine = engine.blocking_write();
        let date = if req_payload.date.trim().is_empty() {
            engine
                .store()
                .series(&req_payload.symbol)
                .and_then(|series| series.last_date())
                .map(str::to_string)
                .ok_or_else(|| EngineError::SymbolNotFound(req_payload.symbol.clone()))?
        } else {
            req_payload.date.clone()
        };
        engine.reading_at(&req_payload.symbol, &date, calculator.as_ref())
    })
    .await
    .map_err(|e| EngineError::ProcessingError(format!("Indicator task failed: {}", e)))??;

    Ok(IndicatorResponse {
        indicator_name: reading.indicator.clone(),
        value: reading.primary(),
        reading,
    })
}
