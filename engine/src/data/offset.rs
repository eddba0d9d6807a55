// Date -> array offset resolution over an ascending trading calendar
use std::collections::HashMap;

/// Index of the first trading date `>= date`, clamped to the ends of the calendar.
///
/// Dates on or after the last bar resolve to the last index, dates on or before the
/// first bar to 0. A date falling in a gap (holiday, suspension) resolves to the next
/// trading day. Returns `None` only for an empty calendar.
pub fn lower_bound_offset(dates: &[String], date: &str) -> Option<usize> {
    let last = dates.last()?;
    if date >= last.as_str() {
        return Some(dates.len() - 1);
    }
    if date <= dates[0].as_str() {
        return Some(0);
    }
    Some(dates.partition_point(|d| d.as_str() < date))
}

/// Index of `date` only if it is a trading date in the calendar.
pub fn exact_offset(dates: &[String], date: &str) -> Option<usize> {
    dates.binary_search_by(|d| d.as_str().cmp(date)).ok()
}

/// Memoizes [`lower_bound_offset`] per (symbol, date).
///
/// Each entry remembers the calendar length it was resolved against and is ignored
/// once the symbol's series has grown.
#[derive(Debug, Default)]
pub struct OffsetResolver {
    memo: HashMap<(String, String), (usize, usize)>,
}

impl OffsetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, symbol: &str, dates: &[String], date: &str) -> Option<usize> {
        let key = (symbol.to_string(), date.to_string());
        if let Some(&(len, offset)) = self.memo.get(&key) {
            if len == dates.len() {
                return Some(offset);
            }
        }

        let offset = lower_bound_offset(dates, date)?;
        self.memo.insert(key, (dates.len(), offset));
        Some(offset)
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> Vec<String> {
        ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-08", "2024-01-09", "2024-01-12"]
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn test_exact_match_resolves_to_own_index() {
        let dates = calendar();
        for (k, date) in dates.iter().enumerate() {
            assert_eq!(lower_bound_offset(&dates, date), Some(k));
            assert_eq!(exact_offset(&dates, date), Some(k));
        }
    }

    #[test]
    fn test_clamps_outside_history() {
        let dates = calendar();
        assert_eq!(lower_bound_offset(&dates, "2023-12-31"), Some(0));
        assert_eq!(lower_bound_offset(&dates, "2030-01-01"), Some(dates.len() - 1));
    }

    #[test]
    fn test_gap_resolves_to_next_trading_day() {
        let dates = calendar();
        assert_eq!(lower_bound_offset(&dates, "2024-01-05"), Some(3));
        assert_eq!(lower_bound_offset(&dates, "2024-01-07"), Some(3));
        assert_eq!(lower_bound_offset(&dates, "2024-01-10"), Some(5));
        assert_eq!(exact_offset(&dates, "2024-01-05"), None);
    }

    #[test]
    fn test_single_and_empty_calendar() {
        let single = vec!["2024-01-02".to_string()];
        assert_eq!(lower_bound_offset(&single, "2020-01-01"), Some(0));
        assert_eq!(lower_bound_offset(&single, "2024-01-02"), Some(0));
        assert_eq!(lower_bound_offset(&single, "2030-01-01"), Some(0));
        assert_eq!(lower_bound_offset(&[], "2024-01-02"), None);
    }

    #[test]
    fn test_resolver_memo_invalidated_by_growth() {
        let mut dates = calendar();
        let mut resolver = OffsetResolver::new();
        assert_eq!(resolver.resolve("SZ.000001", &dates, "2024-01-15"), Some(5));
        assert_eq!(resolver.resolve("SZ.000001", &dates, "2024-01-15"), Some(5));
        assert_eq!(resolver.len(), 1);

        dates.push("2024-01-15".to_string());
        dates.push("2024-01-16".to_string());
        assert_eq!(resolver.resolve("SZ.000001", &dates, "2024-01-15"), Some(6));
        assert_eq!(resolver.resolve("SZ.000002", &dates, "2024-01-15"), Some(6));
        assert_eq!(resolver.len(), 2);
    }
}
