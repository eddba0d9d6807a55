// Stochastic KDJ
//   RSV: (CLOSE - LLV(LOW, N)) / (HHV(HIGH, N) - LLV(LOW, N)) * 100
//   K:   SMA(RSV, M, 1)
//   D:   SMA(K, M, 1)
//   J:   3 * K - 2 * D
use super::primitives::{rolling_max, rolling_min, weighted_recurrence, zip_with};
use super::{require_window, ComputeContext, IndicatorCalculator, IndicatorKey};
use crate::error::Result;
use serde_json::Value;

const RSV_EPSILON: f64 = 1e-8;

pub struct Kdj {
    name: String,
    n: usize,
    m: usize,
}

impl Kdj {
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            name: format!("KDJ({},{})", n, m),
            n,
            m,
        }
    }
}

impl IndicatorCalculator for Kdj {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "n": self.n, "m": self.m })
    }

    fn key(&self) -> IndicatorKey {
        IndicatorKey::new("kdj", &[self.n, self.m])
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["j", "k", "d"]
    }

    fn validate(&self) -> Result<()> {
        // LLV/HHV need a window of at least two bars.
        require_window("KDJ", "n", self.n, 2)?;
        require_window("KDJ", "m", self.m, 1)
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_>) -> Vec<Vec<f64>> {
        let n = self.n;
        let llv = ctx.memoized(IndicatorKey::new("llv", &[n]), |p| rolling_min(p.low, n));
        let hhv = ctx.memoized(IndicatorKey::new("hhv", &[n]), |p| rolling_max(p.high, n));
        let close = ctx.prices().close;

        let mut rsv: Vec<f64> = close
            .iter()
            .zip(llv.iter().zip(&hhv))
            .map(|(c, (l, h))| (c - l) / (h - l + RSV_EPSILON) * 100.0)
            .collect();
        // A NaN on the first bar would poison every later K and D value.
        if let Some(first) = rsv.first_mut() {
            if first.is_nan() {
                *first = 0.0;
            }
        }

        let k = weighted_recurrence(&rsv, self.m, 1);
        let d = weighted_recurrence(&k, self.m, 1);
        let j = zip_with(&k, &d, |k, d| 3.0 * k - 2.0 * d);
        vec![j, k, d]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_f64_vec_eq, series_from_hlc};
    use crate::indicators::IndicatorCache;

    fn run(kdj: &Kdj, rows: &[(f64, f64, f64)]) -> Vec<Vec<f64>> {
        let series = series_from_hlc(rows);
        let mut cache = IndicatorCache::new();
        let mut ctx = ComputeContext::new("SZ.000001", series.arrays(), &mut cache);
        kdj.calculate(&mut ctx)
    }

    #[test]
    fn test_kdj_calculation() {
        // (high, low, close)
        let rows = [(10.0, 8.0, 9.0), (12.0, 9.0, 11.0), (11.0, 9.0, 10.0)];
        let outputs = run(&Kdj::new(2, 2), &rows);

        // LLV(low, 2) = [8, 8, 9]; HHV(high, 2) = [10, 12, 12]
        let rsv = [
            1.0 / (2.0 + RSV_EPSILON) * 100.0,
            3.0 / (4.0 + RSV_EPSILON) * 100.0,
            1.0 / (3.0 + RSV_EPSILON) * 100.0,
        ];
        let k0 = rsv[0];
        let k1 = k0 / 2.0 + rsv[1] / 2.0;
        let k2 = k1 / 2.0 + rsv[2] / 2.0;
        let d0 = k0;
        let d1 = d0 / 2.0 + k1 / 2.0;
        let d2 = d1 / 2.0 + k2 / 2.0;

        assert_f64_vec_eq(&outputs[1], &[k0, k1, k2]);
        assert_f64_vec_eq(&outputs[2], &[d0, d1, d2]);
        assert_f64_vec_eq(&outputs[0], &[3.0 * k0 - 2.0 * d0, 3.0 * k1 - 2.0 * d1, 3.0 * k2 - 2.0 * d2]);
    }

    #[test]
    fn test_kdj_first_bar_nan_forced_to_zero() {
        // Missing first close (e.g. a suspended first session).
        let rows = [(10.0, 8.0, f64::NAN), (12.0, 9.0, 11.0), (11.0, 9.0, 10.0)];
        let outputs = run(&Kdj::new(3, 3), &rows);
        assert_eq!(outputs[1][0], 0.0);
        assert!(outputs.iter().all(|o| o.iter().all(|v| v.is_finite())));
    }

    #[test]
    fn test_kdj_flat_first_day_is_zero() {
        let rows = [(5.0, 5.0, 5.0), (6.0, 5.0, 6.0)];
        let outputs = run(&Kdj::new(9, 3), &rows);
        assert_eq!(outputs[1][0], 0.0);
        assert_eq!(outputs[0][0], 0.0);
    }

    #[test]
    fn test_kdj_caches_extrema() {
        let series = series_from_hlc(&[(10.0, 8.0, 9.0), (12.0, 9.0, 11.0)]);
        let mut cache = IndicatorCache::new();
        {
            let mut ctx = ComputeContext::new("SZ.000001", series.arrays(), &mut cache);
            Kdj::new(2, 2).calculate(&mut ctx);
        }
        assert_eq!(cache.get("SZ.000001", &IndicatorKey::new("llv", &[2])).unwrap(), &[8.0, 8.0]);
        assert_eq!(cache.get("SZ.000001", &IndicatorKey::new("hhv", &[2])).unwrap(), &[10.0, 12.0]);
    }

    #[test]
    fn test_kdj_validation() {
        assert!(Kdj::new(1, 3).validate().is_err());
        assert!(Kdj::new(9, 0).validate().is_err());
        assert!(Kdj::new(9, 3).validate().is_ok());
        assert_eq!(Kdj::new(9, 3).key().to_string(), "kdj-9-3");
    }
}
