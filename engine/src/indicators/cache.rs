//! Memo of full-history indicator arrays, keyed by symbol and [`IndicatorKey`].

use std::collections::HashMap;

use super::key::IndicatorKey;
use crate::error::{EngineError, Result};

/// Per-symbol storage of previously computed arrays.
///
/// The cache does not validate what it stores and never evicts. Callers decide
/// whether an entry is stale by comparing its length with the symbol's current
/// series length.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    symbols: HashMap<String, HashMap<IndicatorKey, Vec<f64>>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str, key: &IndicatorKey) -> bool {
        self.symbols
            .get(symbol)
            .map_or(false, |entries| entries.contains_key(key))
    }

    /// Fails with [`EngineError::CacheMiss`] when nothing is stored under the key.
    pub fn get(&self, symbol: &str, key: &IndicatorKey) -> Result<&[f64]> {
        self.symbols
            .get(symbol)
            .and_then(|entries| entries.get(key))
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::CacheMiss {
                symbol: symbol.to_string(),
                key: key.to_string(),
            })
    }

    /// Stored array only if it covers exactly `series_len` rows.
    pub fn get_fresh(&self, symbol: &str, key: &IndicatorKey, series_len: usize) -> Option<&[f64]> {
        self.get(symbol, key)
            .ok()
            .filter(|values| values.len() == series_len)
    }

    /// Overwrites unconditionally.
    pub fn set(&mut self, symbol: &str, key: IndicatorKey, values: Vec<f64>) {
        self.symbols
            .entry(symbol.to_string())
            .or_default()
            .insert(key, values);
    }

    pub fn remove_symbol(&mut self, symbol: &str) -> bool {
        self.symbols.remove(symbol).is_some()
    }

    /// Number of cached arrays across all symbols.
    pub fn len(&self) -> usize {
        self.symbols.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys_for(&self, symbol: &str) -> Vec<&IndicatorKey> {
        let mut keys: Vec<&IndicatorKey> = self
            .symbols
            .get(symbol)
            .map(|entries| entries.keys().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
