// Technical indicators module
pub mod cache;
pub mod cci;
pub mod dmi;
pub mod engine;
pub mod factory;
pub mod kdj;
pub mod key;
pub mod ma;
pub mod macd;
pub mod mtm;
pub mod primitives;
pub mod rsi;

pub use cache::IndicatorCache;
pub use cci::Cci;
pub use dmi::Dmi;
pub use engine::IndicatorEngine;
pub use factory::build_indicator;
pub use kdj::Kdj;
pub use key::IndicatorKey;
pub use ma::Ma;
pub use macd::Macd;
pub use mtm::Mtm;
pub use rsi::Rsi;

use serde_json::Value;

use crate::data::PriceArrays;
use crate::error::{EngineError, Result};

/// Common trait for all indicators.
///
/// Implementations are stateless parameter holders; every computation runs over
/// the entire history of a symbol.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;

    /// Parameters used for this indicator instance
    fn parameters(&self) -> Value;

    fn key(&self) -> IndicatorKey;

    /// Names of the arrays returned by `calculate`, primary output first.
    fn output_names(&self) -> &'static [&'static str];

    fn validate(&self) -> Result<()>;

    /// One full-length array per entry of `output_names`, in the same order.
    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>>;

    /// Primary output over the full history, computed without any shared cache.
    fn compute_series(&self, prices: PriceArrays<'_>) -> Vec<f64> {
        let mut cache = IndicatorCache::new();
        let mut ctx = ComputeContext::new("", prices, &mut cache);
        self.calculate(&mut ctx).into_iter().next().unwrap_or_default()
    }
}

/// Inputs of one indicator computation: the symbol's price arrays plus access to
/// the cache for intermediate series shared between indicators.
pub struct ComputeContext<'a> {
    symbol: &'a str,
    prices: PriceArrays<'a>,
    cache: &'a mut IndicatorCache,
}

impl<'a> ComputeContext<'a> {
    pub fn new(symbol: &'a str, prices: PriceArrays<'a>, cache: &'a mut IndicatorCache) -> Self {
        ComputeContext { symbol, prices, cache }
    }

    pub fn symbol(&self) -> &str {
        self.symbol
    }

    pub fn prices(&self) -> PriceArrays<'a> {
        self.prices
    }

    /// Cached array for `key` when it covers the whole series, otherwise computes it
    /// from the full history and overwrites the cache entry.
    pub fn memoized(&mut self, key: IndicatorKey, compute: impl FnOnce(PriceArrays<'a>) -> Vec<f64>) -> Vec<f64> {
        if let Some(values) = self.cache.get_fresh(self.symbol, &key, self.prices.len()) {
            tracing::trace!(symbol = %self.symbol, key = %key, "Intermediate series cache hit");
            return values.to_vec();
        }
        let values = compute(self.prices);
        self.cache.set(self.symbol, key, values.clone());
        values
    }
}

pub(crate) fn require_window(indicator: &str, param: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(EngineError::InvalidParameter(format!(
            "{} parameter '{}' must be >= {}, got {}",
            indicator, param, min, value
        )));
    }
    Ok(())
}
