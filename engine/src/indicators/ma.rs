// Simple Moving Average (MA) of the close
use super::primitives::moving_average;
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

pub struct Ma {
    name: String,
    period: usize,
}

impl Ma {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("MA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("ma", &[self.period])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["ma"]
    }

    fn validate(&self) -> Result<()> {
        require_window("MA", "period", self.period, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let close = ctx.prices().close;
        // A window as long as the history never yields a usable series.
        if close.len() <= self.period {
            return vec![vec![f64::NAN; close.len()]];
        }
        vec![moving_average(close, self.period)]
    }
}
