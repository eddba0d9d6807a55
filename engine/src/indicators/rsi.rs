// Relative Strength Index (RSI)
//   LC:  REF(CLOSE, 1)
//   RSI: SMA(MAX(CLOSE - LC, 0), N, 1) / SMA(ABS(CLOSE - LC), N, 1) * 100
use super::primitives::{shift_by_offset, weighted_recurrence, zip_with};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

/// Added to the denominator so flat runs do not divide by zero.
const RSI_EPSILON: f64 = 1e-6;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("rsi", &[self.period])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["rsi"]
    }

    fn validate(&self) -> Result<()> {
        require_window("RSI", "period", self.period, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let close = ctx.prices().close;
        let lc = shift_by_offset(close, 1);
        let change = zip_with(close, &lc, |c, l| c - l);

        let gains: Vec<f64> = change.iter().map(|c| c.max(0.0)).collect();
        let moves: Vec<f64> = change.iter().map(|c| c.abs()).collect();

        let avg_gain = weighted_recurrence(&gains, self.period, 1);
        let avg_move = weighted_recurrence(&moves, self.period, 1);
        vec![zip_with(&avg_gain, &avg_move, |g, m| g / (m + RSI_EPSILON) * 100.0)]
    }
}
