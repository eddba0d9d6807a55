// In-memory time series store holding one PriceSeries per symbol
use serde::{Deserialize, Serialize};
use shared::models::{Bar, PriceColumn};
use shared::utils::normalize_trade_date;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::offset::lower_bound_offset;
use super::price_series::{PriceArrays, PriceSeries};
use crate::error::{EngineError, Result};

/// Source of per-symbol price arrays consumed by the indicator engine.
pub trait TimeSeriesStore {
    fn price_arrays(&self, symbol: &str) -> Option<PriceArrays<'_>>;

    /// Stores a computed array alongside the symbol's price columns.
    fn append_derived_column(&mut self, symbol: &str, name: &str, values: Vec<f64>) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarketDataStore {
    data: HashMap<String, PriceSeries>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore {
            data: HashMap::new(),
        }
    }

    /// Creates the symbol's series or appends to its tail. Returns the number of rows added.
    pub fn add_bars(&mut self, symbol: &str, bars: Vec<Bar>) -> Result<usize> {
        let bars = bars
            .into_iter()
            .map(|mut bar| {
                bar.date = normalize_trade_date(&bar.date)
                    .map_err(|_| EngineError::InvalidDate(bar.date.clone()))?;
                Ok(bar)
            })
            .collect::<Result<Vec<Bar>>>()?;

        let added = match self.data.get_mut(symbol) {
            Some(series) => series.append_bars(bars),
            None => {
                let series = PriceSeries::from_bars(bars);
                let added = series.len();
                self.data.insert(symbol.to_string(), series);
                added
            }
        };

        tracing::debug!(symbol = %symbol, added, total = self.len_of(symbol), "Stored bars");
        Ok(added)
    }

    pub fn series(&self, symbol: &str) -> Option<&PriceSeries> {
        self.data.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.data.contains_key(symbol)
    }

    pub fn len_of(&self, symbol: &str) -> usize {
        self.data.get(symbol).map_or(0, PriceSeries::len)
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.data.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Trading dates from `date` on; `date` may be a non-trading day.
    pub fn dates_since(&self, symbol: &str, date: &str) -> Option<&[String]> {
        let series = self.data.get(symbol)?;
        let offset = lower_bound_offset(series.dates(), date)?;
        Some(&series.dates()[offset..])
    }

    /// One price column from `date` on; `date` may be a non-trading day.
    pub fn array_since(&self, symbol: &str, column: PriceColumn, date: &str) -> Option<&[f64]> {
        let series = self.data.get(symbol)?;
        let offset = lower_bound_offset(series.dates(), date)?;
        Some(&series.column(column)[offset..])
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(writer, self)?;
        tracing::info!(path = %path.as_ref().display(), symbols = self.data.len(), "Saved market data snapshot");
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let store: MarketDataStore = serde_json::from_reader(reader)?;
        for (symbol, series) in &store.data {
            series.validate().map_err(|e| {
                EngineError::MarketDataError(format!("Snapshot series for symbol '{}' is invalid: {}", symbol, e))
            })?;
        }
        tracing::info!(path = %path.as_ref().display(), symbols = store.data.len(), "Loaded market data snapshot");
        Ok(store)
    }
}

impl TimeSeriesStore for MarketDataStore {
    fn price_arrays(&self, symbol: &str) -> Option<PriceArrays<'_>> {
        self.data.get(symbol).map(PriceSeries::arrays)
    }

    fn append_derived_column(&mut self, symbol: &str, name: &str, values: Vec<f64>) -> Result<()> {
        self.data
            .get_mut(symbol)
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.to_string()))?
            .set_derived_column(name, values)
    }
}
