// Directional Movement Index (DMI)
//   MTR: SUM(MAX(MAX(HIGH - LOW, ABS(HIGH - REF(CLOSE, 1))), ABS(REF(CLOSE, 1) - LOW)), N)
//   HD:  HIGH - REF(HIGH, 1)
//   LD:  REF(LOW, 1) - LOW
//   DMP: SUM(IF(HD > 0 && HD > LD, HD, 0), N)
//   DMM: SUM(IF(LD > 0 && LD > HD, LD, 0), N)
//   PDI: DMP * 100 / MTR
//   MDI: DMM * 100 / MTR
use super::primitives::{rolling_sum, shift_by_offset, zip_with};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

pub struct Dmi {
    name: String,
    period: usize,
}

impl Dmi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("DMI({})", period),
            period,
        }
    }
}

fn directional_ratio(dm: &[f64], mtr: &[f64]) -> Vec<f64> {
    zip_with(dm, mtr, |dm, tr| {
        let ratio = dm * 100.0 / tr;
        if ratio.is_finite() {
            ratio
        } else {
            f64::NAN
        }
    })
}

impl IndicatorCalculator for Dmi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("dmi", &[self.period])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["pdi", "mdi"]
    }

    fn validate(&self) -> Result<()> {
        require_window("DMI", "period", self.period, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let prices = ctx.prices();
        let len = prices.len();
        if len <= self.period {
            return vec![vec![f64::NAN; len], vec![f64::NAN; len]];
        }

        let ref_close = shift_by_offset(prices.close, 1);
        let true_range: Vec<f64> = (0..len)
            .map(|i| {
                let (high, low) = (prices.high[i], prices.low[i]);
                (high - low).max((high - ref_close[i]).abs()).max((ref_close[i] - low).abs())
            })
            .collect();
        let period = self.period;
        let mtr = ctx.memoized(IndicatorKey::new("mtr", &[period]), |_| rolling_sum(&true_range, period));

        let hd = zip_with(prices.high, &shift_by_offset(prices.high, 1), |h, r| h - r);
        let ld = zip_with(&shift_by_offset(prices.low, 1), prices.low, |r, l| r - l);
        let plus_dm = zip_with(&hd, &ld, |hd, ld| if hd > 0.0 && hd > ld { hd } else { 0.0 });
        let minus_dm = zip_with(&ld, &hd, |ld, hd| if ld > 0.0 && ld > hd { ld } else { 0.0 });

        let pdi = directional_ratio(&rolling_sum(&plus_dm, period), &mtr);
        let mdi = directional_ratio(&rolling_sum(&minus_dm, period), &mtr);
        vec![pdi, mdi]
    }
}
