// Commodity Channel Index (CCI)
//   TYP: (HIGH + LOW + CLOSE) / 3
//   CCI: (TYP - MA(TYP, N)) / (0.015 * AVEDEV(TYP, N))
use super::primitives::{mean_absolute_deviation, moving_average};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

const CCI_SCALE: f64 = 0.015;

pub struct Cci {
    name: String,
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("CCI({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Cci {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("cci", &[self.period])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["cci"]
    }

    fn validate(&self) -> Result<()> {
        require_window("CCI", "period", self.period, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let prices = ctx.prices();
        if prices.len() <= self.period {
            return vec![vec![f64::NAN; prices.len()]];
        }

        let typ: Vec<f64> = (0..prices.len())
            .map(|i| (prices.high[i] + prices.low[i] + prices.close[i]) / 3.0)
            .collect();
        let ma = moving_average(&typ, self.period);
        let avedev = mean_absolute_deviation(&typ, self.period);

        let cci = (0..typ.len())
            .map(|i| {
                if avedev[i] == 0.0 {
                    // A window with no dispersion sits exactly on its mean.
                    0.0
                } else {
                    (typ[i] - ma[i]) / (CCI_SCALE * avedev[i])
                }
            })
            .collect();
        vec![cci]
    }
}
