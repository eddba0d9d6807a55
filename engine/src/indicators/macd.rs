// Moving Average Convergence Divergence (MACD)
//   DIF:  EMA(CLOSE, SHORT) - EMA(CLOSE, LONG)
//   DEA:  EMA(DIF, MID)
//   MACD: (DIF - DEA) * 2
use super::primitives::{exponential_moving_average, zip_with};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

pub struct Macd {
    name: String,
    short: usize,
    long: usize,
    mid: usize,
}

impl Macd {
    pub fn new(short: usize, long: usize, mid: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", short, long, mid),
            short,
            long,
            mid,
        }
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "short": self.short, "long": self.long, "mid": self.mid })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("macd", &[self.short, self.long, self.mid])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["macd", "dif", "dea"]
    }

    fn validate(&self) -> Result<()> {
        require_window("MACD", "short", self.short, 1)?;
        require_window("MACD", "long", self.long, 1)?;
        require_window("MACD", "mid", self.mid, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let (short, long) = (self.short, self.long);
        let ema_short = ctx.memoized(IndicatorKey::new("ema", &[short]), |p| exponential_moving_average(p.close, short));
        let ema_long = ctx.memoized(IndicatorKey::new("ema", &[long]), |p| exponential_moving_average(p.close, long));

        let dif = zip_with(&ema_short, &ema_long, |s, l| s - l);
        let dea = exponential_moving_average(&dif, self.mid);
        let macd = zip_with(&dif, &dea, |d, e| (d - e) * 2.0);
        vec![macd, dif, dea]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::primitives::exponential_moving_average;
    use crate::indicators::test_support::{assert_f64_vec_eq, series_from_closes};
    use crate::indicators::IndicatorCache;

    const CLOSES: [f64; 8] = [10.0, 10.5, 10.2, 10.8, 11.5, 11.1, 11.9, 12.4];

    #[test]
    fn test_macd_matches_formula() {
        let series = series_from_closes(&CLOSES);
        let macd = Macd::new(3, 5, 2).compute_series(series.arrays());

        let short = exponential_moving_average(&CLOSES, 3);
        let long = exponential_moving_average(&CLOSES, 5);
        let dif: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();
        let dea = exponential_moving_average(&dif, 2);
        let expected: Vec<f64> = dif.iter().zip(&dea).map(|(d, e)| (d - e) * 2.0).collect();
        assert_f64_vec_eq(&macd, &expected);
        // Seeded EMAs start equal, so the first bar has no divergence.
        assert_eq!(macd[0], 0.0);
    }

    #[test]
    fn test_macd_flat_prices_are_zero() {
        let series = series_from_closes(&[7.0; 30]);
        let macd = Macd::new(12, 26, 9).compute_series(series.arrays());
        assert!(macd.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_macd_outputs_and_shared_emas() {
        let series = series_from_closes(&CLOSES);
        let mut cache = IndicatorCache::new();
        let outputs = {
            let mut ctx = ComputeContext::new("SZ.000001", series.arrays(), &mut cache);
            Macd::new(3, 5, 2).calculate(&mut ctx)
        };
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| o.len() == CLOSES.len()));
        assert!(cache.contains("SZ.000001", &IndicatorKey::new("ema", &[3])));
        assert!(cache.contains("SZ.000001", &IndicatorKey::new("ema", &[5])));

        // macd == (dif - dea) * 2 for every index
        for i in 0..CLOSES.len() {
            assert!((outputs[0][i] - (outputs[1][i] - outputs[2][i]) * 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_macd_validation() {
        assert!(Macd::new(12, 26, 0).validate().is_err());
        assert!(Macd::new(12, 26, 9).validate().is_ok());
        assert_eq!(Macd::new(12, 26, 9).key().to_string(), "macd-12-26-9");
    }
}
