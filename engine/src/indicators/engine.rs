// Query core: resolves dates, serves indicator values from the cache and
// recomputes full-history arrays when the series has grown
use shared::models::{IndicatorReading, OutputValue};
use shared::utils::normalize_trade_date;

use super::{ComputeContext, IndicatorCache, IndicatorCalculator, IndicatorKey};
use crate::config::settings::{EngineSettings, NonTradingDatePolicy};
use crate::data::offset::exact_offset;
use crate::data::{OffsetResolver, TimeSeriesStore};
use crate::error::{EngineError, Result};

pub struct IndicatorEngine<S: TimeSeriesStore> {
    store: S,
    cache: IndicatorCache,
    resolver: OffsetResolver,
    policy: NonTradingDatePolicy,
    write_derived_columns: bool,
}

impl<S: TimeSeriesStore> IndicatorEngine<S> {
    pub fn new(store: S) -> Self {
        IndicatorEngine {
            store,
            cache: IndicatorCache::new(),
            resolver: OffsetResolver::new(),
            policy: NonTradingDatePolicy::default(),
            write_derived_columns: false,
        }
    }

    pub fn with_settings(store: S, settings: &EngineSettings) -> Self {
        let mut engine = Self::new(store);
        engine.policy = settings.non_trading_date_policy;
        engine.write_derived_columns = settings.write_derived_columns;
        engine
    }

    pub fn with_policy(mut self, policy: NonTradingDatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> NonTradingDatePolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access for appending bars; cached arrays of a grown series are
    /// recomputed on their next query.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Primary output at `date`. `Ok(None)` means "no value".
    pub fn value_at(&mut self, symbol: &str, date: &str, calculator: &dyn IndicatorCalculator) -> Result<Option<f64>> {
        self.shifted_value(symbol, date, calculator, Some)
    }

    /// Primary output `bars_back` trading days before the bar that answers `date`.
    pub fn previous_value(
        &mut self,
        symbol: &str,
        date: &str,
        bars_back: usize,
        calculator: &dyn IndicatorCalculator,
    ) -> Result<Option<f64>> {
        self.shifted_value(symbol, date, calculator, |offset| offset.checked_sub(bars_back))
    }

    /// Primary output `bars_ahead` trading days after the bar that answers `date`.
    pub fn next_value(
        &mut self,
        symbol: &str,
        date: &str,
        bars_ahead: usize,
        calculator: &dyn IndicatorCalculator,
    ) -> Result<Option<f64>> {
        self.shifted_value(symbol, date, calculator, |offset| offset.checked_add(bars_ahead))
    }

    /// Every output of the indicator at `date`, with the trading date that answered it.
    pub fn reading_at(
        &mut self,
        symbol: &str,
        date: &str,
        calculator: &dyn IndicatorCalculator,
    ) -> Result<IndicatorReading> {
        self.refresh(symbol, calculator)?;
        let offset = self.resolve(symbol, date)?;
        let key = calculator.key();

        let resolved_date = offset.and_then(|i| {
            self.store
                .price_arrays(symbol)
                .and_then(|prices| prices.dates.get(i).cloned())
        });
        let values = calculator
            .output_names()
            .iter()
            .enumerate()
            .map(|(index, &name)| OutputValue {
                name: name.to_string(),
                value: offset.and_then(|i| self.cached_value(symbol, &key.for_output(index, name), i)),
            })
            .collect();

        Ok(IndicatorReading {
            symbol: symbol.to_string(),
            indicator: calculator.name().to_string(),
            parameters: calculator.parameters(),
            requested_date: date.to_string(),
            resolved_date,
            offset,
            values,
        })
    }

    /// Full-history primary array, NaN where there is no value.
    pub fn series(&mut self, symbol: &str, calculator: &dyn IndicatorCalculator) -> Result<Vec<f64>> {
        self.refresh(symbol, calculator)?;
        Ok(self.cache.get(symbol, &calculator.key())?.to_vec())
    }

    fn shifted_value(
        &mut self,
        symbol: &str,
        date: &str,
        calculator: &dyn IndicatorCalculator,
        shift: impl FnOnce(usize) -> Option<usize>,
    ) -> Result<Option<f64>> {
        let len = self.refresh(symbol, calculator)?;
        let target = self.resolve(symbol, date)?.and_then(shift).filter(|&i| i < len);
        Ok(target.and_then(|i| self.cached_value(symbol, &calculator.key(), i)))
    }

    fn cached_value(&self, symbol: &str, key: &IndicatorKey, index: usize) -> Option<f64> {
        let values = self.cache.get(symbol, key).ok()?;
        values.get(index).copied().filter(|v| v.is_finite())
    }

    /// Makes sure every output of `calculator` is cached at the current series length.
    /// Returns that length.
    fn refresh(&mut self, symbol: &str, calculator: &dyn IndicatorCalculator) -> Result<usize> {
        calculator.validate()?;
        let prices = self
            .store
            .price_arrays(symbol)
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.to_string()))?;
        if prices.is_empty() {
            return Err(EngineError::EmptySeries(symbol.to_string()));
        }
        let len = prices.len();
        let key = calculator.key();
        let outputs = calculator.output_names();

        let fresh = outputs
            .iter()
            .enumerate()
            .all(|(index, &name)| self.cache.get_fresh(symbol, &key.for_output(index, name), len).is_some());
        if fresh {
            tracing::debug!(symbol = %symbol, key = %key, "Indicator cache hit");
            return Ok(len);
        }

        tracing::debug!(symbol = %symbol, key = %key, len, "Indicator cache miss, computing full history");
        let computed = {
            let mut ctx = ComputeContext::new(symbol, prices, &mut self.cache);
            calculator.calculate(&mut ctx)
        };
        let primary = match (self.write_derived_columns, computed.first()) {
            (true, Some(values)) => Some(values.clone()),
            _ => None,
        };
        for (index, (&name, values)) in outputs.iter().zip(computed).enumerate() {
            self.cache.set(symbol, key.for_output(index, name), values);
        }
        if let Some(values) = primary {
            self.store.append_derived_column(symbol, &key.to_string(), values)?;
        }
        Ok(len)
    }

    fn resolve(&mut self, symbol: &str, date: &str) -> Result<Option<usize>> {
        let date = normalize_trade_date(date).map_err(|_| EngineError::InvalidDate(date.to_string()))?;
        let dates = self
            .store
            .price_arrays(symbol)
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.to_string()))?
            .dates;
        let offset = match self.policy {
            NonTradingDatePolicy::NextTradingDay => self.resolver.resolve(symbol, dates, &date),
            NonTradingDatePolicy::NoValue => exact_offset(dates, &date),
        };
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketDataStore;
    use crate::indicators::test_support::assert_f64_vec_eq;
    use crate::indicators::{Dmi, Ma, Macd};
    use chrono::{Duration, NaiveDate};
    use shared::models::Bar;

    const SYMBOL: &str = "SZ.000001";

    fn bars(start: &str, rows: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Bar {
                date: (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn closes(values: &[f64]) -> Vec<(f64, f64, f64)> {
        values.iter().map(|&c| (c + 0.5, c - 0.5, c)).collect()
    }

    fn engine_with(start: &str, rows: &[(f64, f64, f64)]) -> IndicatorEngine<MarketDataStore> {
        let mut store = MarketDataStore::new();
        store.add_bars(SYMBOL, bars(start, rows)).unwrap();
        IndicatorEngine::new(store)
    }

    fn sample_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + ((i * 7) % 11) as f64 * 0.37).collect()
    }

    #[test]
    fn test_ma_value_at() {
        let mut engine = engine_with("2024-01-01", &closes(&[10.0, 11.0, 9.0, 12.0, 13.0]));
        let ma = Ma::new(3);

        assert_eq!(engine.value_at(SYMBOL, "2024-01-03", &ma).unwrap(), Some(10.0));
        let last = engine.value_at(SYMBOL, "2024-01-05", &ma).unwrap().unwrap();
        assert!((last - 34.0 / 3.0).abs() < 1e-9);
        assert_eq!(engine.value_at(SYMBOL, "2024-01-02", &ma).unwrap(), None);
        // Dates outside history clamp to the ends.
        assert_eq!(engine.value_at(SYMBOL, "2023-06-01", &ma).unwrap(), None);
        assert_eq!(engine.value_at(SYMBOL, "2030-01-01", &ma).unwrap(), Some(last));
        assert_eq!(engine.value_at(SYMBOL, "20240103", &ma).unwrap(), Some(10.0));
    }

    #[test]
    fn test_recompute_after_growth_matches_full_history() {
        let all = sample_closes(12);
        let mut engine = engine_with("2024-01-01", &closes(&all[..10]));
        let ma = Ma::new(5);
        let macd = Macd::new(3, 6, 2);
        assert_eq!(engine.series(SYMBOL, &ma).unwrap().len(), 10);
        engine.value_at(SYMBOL, "2024-01-10", &macd).unwrap();

        engine
            .store_mut()
            .add_bars(SYMBOL, bars("2024-01-11", &closes(&all[10..])))
            .unwrap();
        let grown = engine.series(SYMBOL, &ma).unwrap();
        let grown_macd = engine.series(SYMBOL, &macd).unwrap();

        let mut full = engine_with("2024-01-01", &closes(&all));
        assert_eq!(grown.len(), 12);
        assert_f64_vec_eq(&grown, &full.series(SYMBOL, &ma).unwrap());
        assert_f64_vec_eq(&grown_macd, &full.series(SYMBOL, &macd).unwrap());
        assert_eq!(
            engine.value_at(SYMBOL, "2024-01-12", &ma).unwrap(),
            full.value_at(SYMBOL, "2024-01-12", &ma).unwrap()
        );
    }

    #[test]
    fn test_cache_hit_is_bit_identical() {
        let mut engine = engine_with("2024-01-01", &closes(&sample_closes(40)));
        let macd = Macd::new(12, 26, 9);

        let miss = engine.value_at(SYMBOL, "2024-02-05", &macd).unwrap().unwrap();
        assert!(engine.cache().contains(SYMBOL, &macd.key()));
        let hit = engine.value_at(SYMBOL, "2024-02-05", &macd).unwrap().unwrap();
        assert_eq!(miss.to_bits(), hit.to_bits());

        let uncached = macd.compute_series(engine.store().series(SYMBOL).unwrap().arrays());
        assert_eq!(uncached[35].to_bits(), hit.to_bits());
    }

    #[test]
    fn test_non_trading_date_policies() {
        let mut store = MarketDataStore::new();
        let mut rows = bars("2024-01-01", &closes(&[10.0, 11.0, 12.0, 13.0]));
        rows.remove(2); // 2024-01-03 is not a trading day
        store.add_bars(SYMBOL, rows).unwrap();

        let mut next_day = IndicatorEngine::new(store);
        let ma = Ma::new(1);
        assert_eq!(next_day.value_at(SYMBOL, "2024-01-03", &ma).unwrap(), Some(13.0));
        assert_eq!(next_day.value_at(SYMBOL, "2024-01-03", &ma).unwrap(), Some(13.0));

        let mut no_value = IndicatorEngine::new(next_day.into_store()).with_policy(NonTradingDatePolicy::NoValue);
        assert_eq!(no_value.value_at(SYMBOL, "2024-01-03", &ma).unwrap(), None);
        assert_eq!(no_value.value_at(SYMBOL, "2024-01-03", &ma).unwrap(), None);
        assert_eq!(no_value.value_at(SYMBOL, "2024-01-04", &ma).unwrap(), Some(13.0));
    }

    #[test]
    fn test_window_wider_than_any_history_has_no_value() {
        let mut engine = engine_with("2024-01-01", &closes(&[10.0, 11.0, 9.0, 12.0, 13.0]));
        let macd = Macd::new(12, usize::MAX, 9);
        assert_eq!(engine.value_at(SYMBOL, "2024-01-05", &macd).unwrap(), None);
        assert_eq!(engine.value_at(SYMBOL, "2024-01-05", &Ma::new(usize::MAX)).unwrap(), None);
    }

    #[test]
    fn test_previous_and_next_value() {
        let mut engine = engine_with("2024-01-01", &closes(&[10.0, 11.0, 9.0, 12.0, 13.0]));
        let ma = Ma::new(1);

        assert_eq!(engine.previous_value(SYMBOL, "2024-01-03", 1, &ma).unwrap(), Some(11.0));
        assert_eq!(engine.next_value(SYMBOL, "2024-01-03", 2, &ma).unwrap(), Some(13.0));
        assert_eq!(engine.next_value(SYMBOL, "2024-01-05", 1, &ma).unwrap(), None);
        assert_eq!(engine.previous_value(SYMBOL, "2024-01-01", 1, &ma).unwrap(), None);
    }

    #[test]
    fn test_offset_memo_follows_growth() {
        let mut engine = engine_with("2024-01-01", &closes(&[10.0, 11.0, 9.0]));
        let ma = Ma::new(1);
        assert_eq!(engine.value_at(SYMBOL, "2024-02-01", &ma).unwrap(), Some(9.0));

        engine
            .store_mut()
            .add_bars(SYMBOL, bars("2024-01-04", &closes(&[12.0, 14.0])))
            .unwrap();
        assert_eq!(engine.value_at(SYMBOL, "2024-02-01", &ma).unwrap(), Some(14.0));
    }

    #[test]
    fn test_query_errors() {
        let mut engine = engine_with("2024-01-01", &closes(&[10.0, 11.0, 9.0]));
        engine.store_mut().add_bars("EMPTY", Vec::new()).unwrap();
        let ma = Ma::new(2);

        assert!(matches!(
            engine.value_at("MISSING", "2024-01-01", &ma),
            Err(EngineError::SymbolNotFound(_))
        ));
        assert!(matches!(
            engine.value_at("EMPTY", "2024-01-01", &ma),
            Err(EngineError::EmptySeries(_))
        ));
        assert!(matches!(
            engine.value_at(SYMBOL, "yesterday", &ma),
            Err(EngineError::InvalidDate(_))
        ));
        assert!(matches!(
            engine.value_at(SYMBOL, "2024-01-01", &Ma::new(0)),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_write_derived_columns() {
        let settings = EngineSettings {
            write_derived_columns: true,
            ..EngineSettings::default()
        };
        let mut store = MarketDataStore::new();
        store.add_bars(SYMBOL, bars("2024-01-01", &closes(&[10.0, 11.0, 9.0, 12.0]))).unwrap();
        let mut engine = IndicatorEngine::with_settings(store, &settings);

        engine.value_at(SYMBOL, "2024-01-04", &Ma::new(3)).unwrap();
        let series = engine.store().series(SYMBOL).unwrap();
        assert_f64_vec_eq(series.derived_column("ma-3").unwrap(), &[f64::NAN, f64::NAN, 10.0, 32.0 / 3.0]);
    }

    #[test]
    fn test_dmi_reading() {
        let rows = [(10.0, 8.0, 9.0), (12.0, 9.0, 11.0), (11.0, 9.0, 10.0)];
        let mut engine = engine_with("2024-01-01", &rows);
        let dmi = Dmi::new(2);

        let reading = engine.reading_at(SYMBOL, "2024-01-03", &dmi).unwrap();
        assert_eq!(reading.indicator, "DMI(2)");
        assert_eq!(reading.resolved_date.as_deref(), Some("2024-01-03"));
        assert_eq!(reading.offset, Some(2));
        assert!((reading.primary().unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(reading.get("mdi"), Some(0.0));

        let keys: Vec<String> = engine.cache().keys_for(SYMBOL).iter().map(|k| k.to_string()).collect();
        assert!(keys.contains(&"dmi-2".to_string()));
        assert!(keys.contains(&"dmi-2:mdi".to_string()));
        assert!(keys.contains(&"mtr-2".to_string()));
    }
}
