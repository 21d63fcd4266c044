//! Range predicates for the search layer
//!
//! Query text is tokenized by the caller; this module only evaluates
//! `>`, `<` and `<>` over progression percent and estimated completion time.
//! Bounds are inclusive.

use achievo_common::GameAchievements;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFilter<T> {
    /// `> x`
    AtLeast(T),
    /// `< x`
    AtMost(T),
    /// `x <> y`
    Between(T, T),
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    /// Build from an operator token; `<>` needs `high`
    pub fn from_operator(op: &str, low: T, high: Option<T>) -> Option<Self> {
        match (op, high) {
            (">", _) => Some(RangeFilter::AtLeast(low)),
            ("<", _) => Some(RangeFilter::AtMost(low)),
            ("<>", Some(high)) => Some(RangeFilter::Between(low, high)),
            _ => None,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        match *self {
            RangeFilter::AtLeast(min) => value >= min,
            RangeFilter::AtMost(max) => value <= max,
            RangeFilter::Between(min, max) => value >= min && value <= max,
        }
    }
}

/// Elapsed time to seconds; units `s`, `min`, `h`
pub fn parse_duration_seconds(value: &str, unit: &str) -> Option<u64> {
    let amount: f64 = value.trim().replace(',', ".").parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "s" | "sec" => 1.0,
        "min" | "m" => 60.0,
        "h" | "hr" => 3600.0,
        _ => return None,
    };
    Some((amount * factor).round() as u64)
}

pub fn filter_by_progress<'a>(
    items: &'a [GameAchievements],
    filter: &RangeFilter<u8>,
) -> Vec<&'a GameAchievements> {
    items.iter().filter(|g| filter.contains(g.progression_percent)).collect()
}

/// Games whose upper time estimate (seconds) is in range
///
/// Games without an estimate never match.
pub fn filter_by_estimate_time<'a>(
    items: &'a [GameAchievements],
    filter: &RangeFilter<u64>,
) -> Vec<&'a GameAchievements> {
    items
        .iter()
        .filter(|g| match &g.estimate_time {
            Some(estimate) if estimate.estimate_time_max > 0 => filter.contains(estimate.max_seconds()),
            _ => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use achievo_common::models::EstimateTimeToUnlock;
    use achievo_common::Game;

    fn game(name: &str, progression: u8, estimate: Option<&str>) -> GameAchievements {
        let mut g = GameAchievements::empty(&Game::new(name));
        g.progression_percent = progression;
        g.estimate_time = estimate.and_then(|e| EstimateTimeToUnlock::parse(e, 10));
        g
    }

    fn names(items: Vec<&GameAchievements>) -> Vec<&str> {
        items.into_iter().map(|g| g.game_name.as_str()).collect()
    }

    #[test]
    fn test_from_operator() {
        assert_eq!(RangeFilter::from_operator(">", 5, None), Some(RangeFilter::AtLeast(5)));
        assert_eq!(RangeFilter::from_operator("<", 5, None), Some(RangeFilter::AtMost(5)));
        assert_eq!(RangeFilter::from_operator("<>", 5, Some(9)), Some(RangeFilter::Between(5, 9)));
        assert_eq!(RangeFilter::from_operator("<>", 5, None), None);
        assert_eq!(RangeFilter::from_operator("=", 5, None), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_seconds("30", "s"), Some(30));
        assert_eq!(parse_duration_seconds("30", "min"), Some(1800));
        assert_eq!(parse_duration_seconds("2", "h"), Some(7200));
        assert_eq!(parse_duration_seconds("1.5", "H"), Some(5400));
        assert_eq!(parse_duration_seconds("2", "days"), None);
        assert_eq!(parse_duration_seconds("x", "h"), None);
    }

    #[test]
    fn test_progress_filter_inclusive() {
        let items = vec![game("a", 10, None), game("b", 30, None), game("c", 90, None)];
        assert_eq!(names(filter_by_progress(&items, &RangeFilter::AtLeast(90))), vec!["c"]);
        assert_eq!(names(filter_by_progress(&items, &RangeFilter::AtMost(30))), vec!["a", "b"]);
        assert_eq!(names(filter_by_progress(&items, &RangeFilter::Between(10, 30))), vec!["a", "b"]);
    }

    #[test]
    fn test_time_filter() {
        let items = vec![
            game("short", 0, Some("1-2h")),
            game("long", 0, Some("30-35h")),
            game("open", 0, Some("100+h")),
            game("unknown", 0, None),
        ];
        let two_hours = parse_duration_seconds("2", "h").unwrap();
        assert_eq!(names(filter_by_estimate_time(&items, &RangeFilter::AtMost(two_hours))), vec!["short"]);
        assert_eq!(
            names(filter_by_estimate_time(&items, &RangeFilter::AtLeast(two_hours))),
            vec!["short", "long", "open"]
        );
        let range = RangeFilter::Between(
            parse_duration_seconds("30", "h").unwrap(),
            parse_duration_seconds("40", "h").unwrap(),
        );
        assert_eq!(names(filter_by_estimate_time(&items, &range)), vec!["long"]);
    }
}
