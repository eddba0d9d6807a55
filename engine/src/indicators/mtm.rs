// Momentum (MTM)
//   MTM:   CLOSE - REF(CLOSE, N)
//   MTMMA: MA(MTM, M)
use super::primitives::{moving_average, shift_by_offset, zip_with};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

pub struct Mtm {
    name: String,
    n: usize,
    m: usize,
}

impl Mtm {
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            name: format!("MTM({},{})", n, m),
            n,
            m,
        }
    }
}

impl IndicatorCalculator for Mtm {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "n": self.n, "m": self.m })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("mtm", &[self.n, self.m])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["mtmma", "mtm"]
    }

    fn validate(&self) -> Result<()> {
        require_window("MTM", "n", self.n, 1)?;
        require_window("MTM", "m", self.m, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let close = ctx.prices().close;
        // The lag is zero-filled, so the first N deltas equal the close itself.
        let delta = zip_with(close, &shift_by_offset(close, self.n), |c, r| c - r);
        let mtmma = if delta.len() <= self.m {
            vec![f64::NAN; delta.len()]
        } else {
            moving_average(&delta, self.m)
        };
        vec![mtmma, delta]
    }
}
