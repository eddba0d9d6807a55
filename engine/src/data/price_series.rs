// Column-oriented daily price history of a single symbol
use serde::{Deserialize, Serialize};
use shared::models::{Bar, PriceColumn};
use std::collections::BTreeMap;

use crate::error::{EngineError, Result};

/// Ordered trading dates with five index-aligned OHLCV columns.
///
/// Dates are strictly increasing and every column has the same length as `dates`.
/// The series only ever grows at the tail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    dates: Vec<String>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    #[serde(default, with = "nan_as_null")]
    derived: BTreeMap<String, Vec<f64>>,
}

// Derived columns carry NaN for "no value", which JSON cannot represent.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        columns: &BTreeMap<String, Vec<f64>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let converted: BTreeMap<&str, Vec<Option<f64>>> = columns
            .iter()
            .map(|(name, values)| {
                let values = values.iter().map(|v| v.is_finite().then_some(*v)).collect();
                (name.as_str(), values)
            })
            .collect();
        converted.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<BTreeMap<String, Vec<f64>>, D::Error> {
        let raw: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
            .collect())
    }
}

/// Borrowed view over a [`PriceSeries`], the input of every indicator formula.
#[derive(Debug, Clone, Copy)]
pub struct PriceArrays<'a> {
    pub dates: &'a [String],
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
    pub volume: &'a [f64],
}

impl<'a> PriceArrays<'a> {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, column: PriceColumn) -> &'a [f64] {
        match column {
            PriceColumn::Open => self.open,
            PriceColumn::High => self.high,
            PriceColumn::Low => self.low,
            PriceColumn::Close => self.close,
            PriceColumn::Volume => self.volume,
        }
    }
}

impl PriceSeries {
    /// Builds a series from unordered bars. Duplicate dates keep the first bar seen.
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        bars.dedup_by(|later, earlier| later.date == earlier.date);

        let mut series = PriceSeries::default();
        for bar in bars {
            series.push(bar);
        }
        series
    }

    /// Appends bars after the current last date and returns how many were added.
    ///
    /// Bars dated on or before the last known date are skipped. Derived columns are
    /// dropped once the series grows since they no longer cover every row.
    pub fn append_bars(&mut self, mut bars: Vec<Bar>) -> usize {
        bars.sort_by(|a, b| a.date.cmp(&b.date));

        let mut appended = 0;
        let mut skipped = 0;
        for bar in bars {
            let is_newer = self
                .dates
                .last()
                .map_or(true, |last| bar.date.as_str() > last.as_str());
            if is_newer {
                self.push(bar);
                appended += 1;
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, last_date = ?self.last_date(), "Skipped bars not newer than the last known date");
        }
        if appended > 0 && !self.derived.is_empty() {
            tracing::debug!(columns = self.derived.len(), "Dropping stale derived columns after series growth");
            self.derived.clear();
        }
        appended
    }

    fn push(&mut self, bar: Bar) {
        self.dates.push(bar.date);
        self.open.push(bar.open);
        self.high.push(bar.high);
        self.low.push(bar.low);
        self.close.push(bar.close);
        self.volume.push(bar.volume);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<&str> {
        self.dates.first().map(String::as_str)
    }

    pub fn last_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }

    pub fn column(&self, column: PriceColumn) -> &[f64] {
        match column {
            PriceColumn::Open => &self.open,
            PriceColumn::High => &self.high,
            PriceColumn::Low => &self.low,
            PriceColumn::Close => &self.close,
            PriceColumn::Volume => &self.volume,
        }
    }

    pub fn arrays(&self) -> PriceArrays<'_> {
        PriceArrays {
            dates: &self.dates,
            open: &self.open,
            high: &self.high,
            low: &self.low,
            close: &self.close,
            volume: &self.volume,
        }
    }

    pub fn bar(&self, index: usize) -> Option<Bar> {
        Some(Bar {
            date: self.dates.get(index)?.clone(),
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
        })
    }

    /// Checks that every column has one value per date and that dates are strictly
    /// ascending. Series built through `from_bars`/`append_bars` always pass.
    pub fn validate(&self) -> Result<()> {
        let len = self.dates.len();
        for column in PriceColumn::ALL {
            let values = self.column(column).len();
            if values != len {
                return Err(EngineError::MarketDataError(format!(
                    "Column '{}' has {} values but the series has {} dates",
                    column, values, len
                )));
            }
        }
        if let Some(pair) = self.dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(EngineError::MarketDataError(format!(
                "Dates are not strictly ascending: '{}' followed by '{}'",
                pair[0], pair[1]
            )));
        }
        if let Some((name, values)) = self.derived.iter().find(|(_, values)| values.len() != len) {
            return Err(EngineError::MarketDataError(format!(
                "Derived column '{}' has {} values but the series has {} dates",
                name,
                values.len(),
                len
            )));
        }
        Ok(())
    }

    pub fn derived_column(&self, name: &str) -> Option<&[f64]> {
        self.derived.get(name).map(Vec::as_slice)
    }

    pub fn derived_column_names(&self) -> impl Iterator<Item = &str> {
        self.derived.keys().map(String::as_str)
    }

    pub fn set_derived_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(EngineError::MarketDataError(format!(
                "Derived column '{}' has {} values but the series has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }
        self.derived.insert(name.to_string(), values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> Bar {
        Bar {
            date: date.to_string(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn test_from_bars_sorts_and_dedups() {
        let series = PriceSeries::from_bars(vec![
            bar("2024-01-03", 3.0),
            bar("2024-01-01", 1.0),
            bar("2024-01-02", 2.0),
            bar("2024-01-01", 9.0),
        ]);
        assert_eq!(series.dates(), &["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(series.column(PriceColumn::Close), &[1.0, 2.0, 3.0]);
        assert_eq!(series.column(PriceColumn::High), &[2.0, 3.0, 4.0]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_append_only_at_tail() {
        let mut series = PriceSeries::from_bars(vec![bar("2024-01-01", 1.0), bar("2024-01-02", 2.0)]);
        let appended = series.append_bars(vec![
            bar("2024-01-04", 4.0),
            bar("2024-01-02", 20.0),
            bar("2023-12-29", 0.5),
            bar("2024-01-03", 3.0),
        ]);
        assert_eq!(appended, 2);
        assert_eq!(series.dates(), &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(series.column(PriceColumn::Close), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_validate_rejects_inconsistent_series() {
        let series = PriceSeries::from_bars(vec![bar("2024-01-01", 1.0), bar("2024-01-02", 2.0)]);
        assert!(series.validate().is_ok());

        let mut ragged = series.clone();
        ragged.high.pop();
        assert!(matches!(ragged.validate(), Err(EngineError::MarketDataError(_))));

        let mut unordered = series.clone();
        unordered.dates.swap(0, 1);
        assert!(unordered.validate().is_err());

        let mut duplicated = series.clone();
        duplicated.dates[1] = "2024-01-01".to_string();
        assert!(duplicated.validate().is_err());

        let mut stale = series;
        stale.derived.insert("ma-2".to_string(), vec![1.5]);
        assert!(stale.validate().is_err());
    }

    #[test]
    fn test_derived_column_length_checked_and_dropped_on_growth() {
        let mut series = PriceSeries::from_bars(vec![bar("2024-01-01", 1.0), bar("2024-01-02", 2.0)]);
        assert!(series.set_derived_column("ma-2", vec![f64::NAN]).is_err());
        series.set_derived_column("ma-2", vec![f64::NAN, 1.5]).unwrap();
        assert_eq!(series.derived_column_names().collect::<Vec<_>>(), vec!["ma-2"]);

        series.append_bars(vec![bar("2024-01-03", 3.0)]);
        assert!(series.derived_column("ma-2").is_none());
    }

    #[test]
    fn test_bar_round_trip_by_index() {
        let series = PriceSeries::from_bars(vec![bar("2024-01-01", 1.0)]);
        assert_eq!(series.bar(0), Some(bar("2024-01-01", 1.0)));
        assert_eq!(series.bar(1), None);
        assert_eq!(series.first_date(), Some("2024-01-01"));
        assert_eq!(series.arrays().len(), 1);
    }
}
