use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One daily OHLCV row for a single trading date ("YYYY-MM-DD").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PriceColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceColumn {
    pub const ALL: [PriceColumn; 5] = [
        PriceColumn::Open,
        PriceColumn::High,
        PriceColumn::Low,
        PriceColumn::Close,
        PriceColumn::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceColumn::Open => "open",
            PriceColumn::High => "high",
            PriceColumn::Low => "low",
            PriceColumn::Close => "close",
            PriceColumn::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceColumn::Open),
            "high" => Ok(PriceColumn::High),
            "low" => Ok(PriceColumn::Low),
            "close" => Ok(PriceColumn::Close),
            "volume" | "vol" => Ok(PriceColumn::Volume),
            other => Err(anyhow::anyhow!("Unknown price column '{}'", other)),
        }
    }
}

/// A single named output of an indicator at one date. `None` means "no value".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub name: String,
    pub value: Option<f64>,
}

/// Point-in-time result of an indicator query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub symbol: String,
    pub indicator: String,
    pub parameters: serde_json::Value,
    pub requested_date: String,
    /// Trading date whose bar answered the query, if any.
    pub resolved_date: Option<String>,
    pub offset: Option<usize>,
    /// Outputs in declaration order; the first one is the primary value.
    pub values: Vec<OutputValue>,
}

impl IndicatorReading {
    pub fn primary(&self) -> Option<f64> {
        self.values.first().and_then(|v| v.value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .and_then(|v| v.value)
    }
}
