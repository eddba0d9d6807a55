// IndicatorService: one IndicatorEngine shared by every caller, with request
// handlers in sibling modules
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{IndicatorRequest, IndicatorResponse, LoadCsvRequest, LoadCsvResponse};
use crate::config::settings::EngineSettings;
use crate::data::market_data::MarketDataStore;
use crate::error::Result;
use crate::indicators::IndicatorEngine;
use shared::models::Bar;

pub mod calculate_indicator;
pub mod load_csv_data;

pub struct IndicatorService {
    engine: Arc<RwLock<IndicatorEngine<MarketDataStore>>>,
    settings: EngineSettings,
}

impl IndicatorService {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_store(MarketDataStore::new(), settings)
    }

    pub fn with_store(store: MarketDataStore, settings: EngineSettings) -> Self {
        let engine = IndicatorEngine::with_settings(store, &settings);
        IndicatorService {
            engine: Arc::new(RwLock::new(engine)),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn engine(&self) -> Arc<RwLock<IndicatorEngine<MarketDataStore>>> {
        self.engine.clone()
    }

    pub async fn load_csv_data(&self, req_payload: LoadCsvRequest) -> Result<LoadCsvResponse> {
        tracing::info!(
            symbol = %req_payload.symbol,
            path = %req_payload.file_path,
            "Received LoadCsvRequest, dispatching to handler."
        );
        load_csv_data::handle_load_csv_data(req_payload, self.engine.clone(), &self.settings).await
    }

    pub async fn calculate_indicator(&self, req_payload: IndicatorRequest) -> Result<IndicatorResponse> {
        tracing::info!(
            symbol = %req_payload.symbol,
            indicator_type = %req_payload.indicator_type,
            date = %req_payload.date,
            parameters = %req_payload.parameters,
            "Received IndicatorRequest, dispatching to handler."
        );
        calculate_indicator::handle_calculate_indicator(
            req_payload,
            self.engine.clone(),
            &self.settings.indicator_defaults,
        )
        .await
    }

    /// Appends newer bars to a symbol's series. Returns the number of rows added.
    pub async fn append_bars(&self, symbol: &str, bars: Vec<Bar>) -> Result<usize> {
        let mut engine = self.engine.write().await;
        engine.store_mut().add_bars(symbol, bars)
    }

    pub async fn symbols(&self) -> Vec<String> {
        let engine = self.engine.read().await;
        engine.store().symbols().into_iter().map(str::to_string).collect()
    }

    pub async fn latest_date(&self, symbol: &str) -> Option<String> {
        let engine = self.engine.read().await;
        engine
            .store()
            .series(symbol)
            .and_then(|series| series.last_date())
            .map(str::to_string)
    }

    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let engine = self.engine.read().await;
        engine.store().save_snapshot(path)
    }
}
