// Builds indicator calculators from a type name and JSON parameters
use serde_json::Value;

use super::{Cci, Dmi, IndicatorCalculator, Kdj, Ma, Macd, Mtm, Rsi};
use crate::config::settings::IndicatorDefaults;
use crate::error::{EngineError, Result};

/// Largest window accepted from a request.
pub const MAX_WINDOW: u64 = u32::MAX as u64;

/// Reads the first of `names` present in `params`, falling back to `default`.
fn param(indicator: &str, params: &Value, names: &[&str], default: usize) -> Result<usize> {
    for name in names {
        if let Some(value) = params.get(*name) {
            return match value.as_u64() {
                Some(window) if window <= MAX_WINDOW => Ok(window as usize),
                Some(window) => Err(EngineError::InvalidParameter(format!(
                    "{} parameter '{}' must be <= {}, got {}",
                    indicator, name, MAX_WINDOW, window
                ))),
                None => Err(EngineError::InvalidParameter(format!(
                    "{} parameter '{}' must be a non-negative integer, got {}",
                    indicator, name, value
                ))),
            };
        }
    }
    Ok(default)
}

/// Accepted type names are case-insensitive: ma, macd, rsi, kdj, mtm, cci, dmi.
/// Single-window indicators read `period` (or `n`).
pub fn build_indicator(
    indicator_type: &str,
    params: &Value,
    defaults: &IndicatorDefaults,
) -> Result<Box<dyn IndicatorCalculator>> {
    if !params.is_object() && !params.is_null() {
        return Err(EngineError::InvalidParameter(format!(
            "Parameters for '{}' must be a JSON object, got {}",
            indicator_type, params
        )));
    }

    let calculator: Box<dyn IndicatorCalculator> = match indicator_type.trim().to_lowercase().as_str() {
        "ma" => Box::new(Ma::new(param("MA", params, &["period", "n"], defaults.ma)?)),
        "macd" => {
            let (short, long, mid) = defaults.macd;
            Box::new(Macd::new(
                param("MACD", params, &["short"], short)?,
                param("MACD", params, &["long"], long)?,
                param("MACD", params, &["mid"], mid)?,
            ))
        }
        "rsi" => Box::new(Rsi::new(param("RSI", params, &["period", "n"], defaults.rsi)?)),
        "kdj" => {
            let (n, m) = defaults.kdj;
            Box::new(Kdj::new(param("KDJ", params, &["n"], n)?, param("KDJ", params, &["m"], m)?))
        }
        "mtm" => {
            let (n, m) = defaults.mtm;
            Box::new(Mtm::new(param("MTM", params, &["n"], n)?, param("MTM", params, &["m"], m)?))
        }
        "cci" => Box::new(Cci::new(param("CCI", params, &["period", "n"], defaults.cci)?)),
        "dmi" => Box::new(Dmi::new(param("DMI", params, &["period", "n"], defaults.dmi)?)),
        _ => {
            tracing::error!(indicator_type = %indicator_type, "Unknown indicator type requested");
            return Err(EngineError::UnknownIndicator(indicator_type.to_string()));
        }
    };

    calculator.validate()?;
    Ok(calculator)
}
