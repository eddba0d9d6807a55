use csv::{ReaderBuilder, StringRecord};
use shared::models::Bar;
use shared::utils::normalize_trade_date;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{EngineError, Result};

// Accepted header spellings per field, matched case-insensitively
const DATE_HEADERS: &[&str] = &["date", "trade_date", "time_key"];
const OPEN_HEADERS: &[&str] = &["open"];
const HIGH_HEADERS: &[&str] = &["high"];
const LOW_HEADERS: &[&str] = &["low"];
const CLOSE_HEADERS: &[&str] = &["close"];
const VOLUME_HEADERS: &[&str] = &["volume", "vol"];

/// Column positions resolved once from the header row.
struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        Ok(ColumnMap {
            date: Self::position(headers, DATE_HEADERS)?,
            open: Self::position(headers, OPEN_HEADERS)?,
            high: Self::position(headers, HIGH_HEADERS)?,
            low: Self::position(headers, LOW_HEADERS)?,
            close: Self::position(headers, CLOSE_HEADERS)?,
            volume: Self::position(headers, VOLUME_HEADERS)?,
        })
    }

    fn position(headers: &StringRecord, names: &[&str]) -> Result<usize> {
        headers
            .iter()
            .position(|header| names.iter().any(|name| header.trim().eq_ignore_ascii_case(name)))
            .ok_or_else(|| {
                EngineError::CsvDataFormatError(format!("Missing '{}' column in CSV header", names[0]))
            })
    }
}

/// Daily bar CSV files: one header row, then `date,open,high,low,close,volume`
/// in any column order (extra columns are ignored).
pub struct DailyCsvParser;

impl DailyCsvParser {
    pub fn load_bars_from_csv(file_path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<Bar>> {
        let file = File::open(file_path.as_ref())?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let columns = ColumnMap::from_headers(&headers)?;

        let mut bars = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let line = idx + 2;

            let date_str = Self::get_field(&record, columns.date, "date", line)?;
            let date = normalize_trade_date(date_str).map_err(|e| {
                EngineError::CsvDataFormatError(format!("Error parsing 'date' at line {}: {}", line, e))
            })?;

            bars.push(Bar {
                date,
                open: Self::parse_number(&record, columns.open, "open", line)?,
                high: Self::parse_number(&record, columns.high, "high", line)?,
                low: Self::parse_number(&record, columns.low, "low", line)?,
                close: Self::parse_number(&record, columns.close, "close", line)?,
                volume: Self::parse_number(&record, columns.volume, "volume", line)?,
            });
        }

        tracing::debug!(path = %file_path.as_ref().display(), rows = bars.len(), "Parsed daily bars from CSV");
        Ok(bars)
    }

    fn get_field<'a>(record: &'a StringRecord, pos: usize, name: &str, line: usize) -> Result<&'a str> {
        record.get(pos).ok_or_else(|| {
            EngineError::CsvDataFormatError(format!("Missing '{}' field in CSV record at line {}", name, line))
        })
    }

    fn parse_number(record: &StringRecord, pos: usize, name: &str, line: usize) -> Result<f64> {
        let raw = Self::get_field(record, pos, name, line)?;
        raw.parse::<f64>().map_err(|e| {
            EngineError::CsvDataFormatError(format!(
                "Error parsing '{}' at line {}: failed to parse number '{}': {}",
                name, line, raw, e
            ))
        })
    }
}
