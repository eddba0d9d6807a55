//! Array recurrences and window functions shared by every indicator formula.
//!
//! All functions return a vector of the same length as their input. "No value"
//! is represented as `f64::NAN`. Window sizes below the documented minimum are
//! programming errors and panic.

/// Simple moving average over a trailing window of `n`.
///
/// Indices `< n - 1` have no value. If `x` is shorter than `n`, nothing has a value.
pub fn moving_average(x: &[f64], n: usize) -> Vec<f64> {
    assert!(n >= 1, "moving average window must be >= 1, got {}", n);
    let mut out = vec![f64::NAN; x.len()];
    for (i, window) in x.windows(n).enumerate() {
        out[i + n - 1] = window.iter().sum::<f64>() / n as f64;
    }
    out
}

/// `y[0] = x[0]`, `y[i] = y[i-1] * (n-m)/n + x[i] * m/n`.
///
/// `weighted_recurrence(x, n + 1, 2)` is the exponential moving average of window `n`.
pub fn weighted_recurrence(x: &[f64], n: usize, m: usize) -> Vec<f64> {
    assert!(n >= 1, "recurrence period must be >= 1, got {}", n);
    let (n, m) = (n as f64, m as f64);
    let mut out: Vec<f64> = Vec::with_capacity(x.len());
    let mut iter = x.iter().copied();
    if let Some(first) = iter.next() {
        let mut prev = first;
        out.push(prev);
        for value in iter {
            prev = prev * (n - m) / n + value * m / n;
            out.push(prev);
        }
    }
    out
}

/// `y[0] = x[0]`, `y[i] = y[i-1] * (n-1)/(n+1) + x[i] * 2/(n+1)`. Defined at every index
/// except when `n + 1` does not fit in `usize`, where nothing has a value.
pub fn exponential_moving_average(x: &[f64], n: usize) -> Vec<f64> {
    assert!(n >= 1, "EMA window must be >= 1, got {}", n);
    match n.checked_add(1) {
        Some(period) => weighted_recurrence(x, period, 2),
        None => vec![f64::NAN; x.len()],
    }
}

// Clamped trailing window: the first n-1 entries see the shorter available history.
fn rolling_window(x: &[f64], n: usize, reduce: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..x.len())
        .map(|i| reduce(&x[(i + 1).saturating_sub(n)..=i]))
        .collect()
}

/// Lowest value of `x[max(0, i-n+1) ..= i]` (LLV). Requires `n > 1`.
pub fn rolling_min(x: &[f64], n: usize) -> Vec<f64> {
    assert!(n > 1, "rolling_min window must be > 1, got {}", n);
    rolling_window(x, n, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Highest value of `x[max(0, i-n+1) ..= i]` (HHV). Requires `n > 1`.
pub fn rolling_max(x: &[f64], n: usize) -> Vec<f64> {
    assert!(n > 1, "rolling_max window must be > 1, got {}", n);
    rolling_window(x, n, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Sum of `x[max(0, i-n+1) ..= i]`, same clamped windowing as [`rolling_min`].
pub fn rolling_sum(x: &[f64], n: usize) -> Vec<f64> {
    assert!(n >= 1, "rolling_sum window must be >= 1, got {}", n);
    rolling_window(x, n, |w| w.iter().sum())
}

/// Mean of `|x[i-j] - MA(x, n)[i]|` for `j` in `0..n` (AVEDEV). No value for `i < n - 1`.
pub fn mean_absolute_deviation(x: &[f64], n: usize) -> Vec<f64> {
    let ma = moving_average(x, n);
    let mut out = vec![f64::NAN; x.len()];
    for i in (n - 1)..x.len() {
        let total: f64 = x[i + 1 - n..=i].iter().map(|v| (v - ma[i]).abs()).sum();
        out[i] = total / n as f64;
    }
    out
}

/// Lag operator (REF): `y[i] = x[i-k]`, zero for `i < k`.
pub fn shift_by_offset(x: &[f64], k: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| if i >= k { x[i - k] } else { 0.0 })
        .collect()
}

/// Element-wise combination of two index-aligned arrays.
pub fn zip_with(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "zip_with requires equal lengths");
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}
