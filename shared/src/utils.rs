// Trade date helpers shared by the engine and any data loaders.
use anyhow::{anyhow, Result};
use chrono::NaiveDate;

pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a trade date given as "YYYY-MM-DD", "YYYYMMDD" or with a trailing time
/// component ("YYYY-MM-DD HH:MM:SS", "YYYY-MM-DDTHH:MM:SS").
pub fn parse_trade_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let date_part = trimmed
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);

    let format = if date_part.len() == 8 && date_part.chars().all(|c| c.is_ascii_digit()) {
        "%Y%m%d"
    } else {
        TRADE_DATE_FORMAT
    };

    NaiveDate::parse_from_str(date_part, format)
        .map_err(|e| anyhow!("Failed to parse trade date '{}': {}", s, e))
}

/// Canonical "YYYY-MM-DD" form; string order of canonical dates is calendar order.
pub fn normalize_trade_date(s: &str) -> Result<String> {
    Ok(parse_trade_date(s)?.format(TRADE_DATE_FORMAT).to_string())
}
