use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

pub const DEFAULT_FALLBACK_HORIZON_MONTHS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub index: usize,
    pub month: NaiveDate,
}

impl Period {
    pub fn label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

/// Gap-free monthly periods from the start month to the end month inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    months: Vec<NaiveDate>,
}

impl Timeline {
    /// An absent end falls back to `start + fallback_horizon_months`. An end
    /// before the start yields the start month alone.
    pub fn monthly(start: NaiveDate, end: Option<NaiveDate>, fallback_horizon_months: u32) -> Self {
        let first = first_of_month(start);
        let end = end.unwrap_or_else(|| {
            first
                .checked_add_months(Months::new(fallback_horizon_months))
                .unwrap_or(first)
        });
        let last = first_of_month(end);

        let span = months_between(first, last).max(0) as u32;
        let months = (0..=span)
            .map_while(|offset| first.checked_add_months(Months::new(offset)))
            .collect();

        Self { months }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.months.len().checked_sub(1)
    }

    pub fn month(&self, index: usize) -> Option<NaiveDate> {
        self.months.get(index).copied()
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.months
            .iter()
            .enumerate()
            .map(|(index, month)| Period {
                index,
                month: *month,
            })
    }

    pub fn labels(&self) -> Vec<String> {
        self.periods().map(|period| period.label()).collect()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn covers_start_through_end_month_inclusive() {
        let timeline = Timeline::monthly(
            date(2025, 1, 15),
            Some(date(2026, 12, 3)),
            DEFAULT_FALLBACK_HORIZON_MONTHS,
        );
        assert_eq!(timeline.len(), 24);
        assert_eq!(timeline.month(0), Some(date(2025, 1, 1)));
        assert_eq!(timeline.month(23), Some(date(2026, 12, 1)));
        assert_eq!(timeline.labels()[12], "2026-01");
    }

    #[test]
    fn missing_end_uses_fallback_horizon() {
        let timeline = Timeline::monthly(date(2025, 3, 1), None, DEFAULT_FALLBACK_HORIZON_MONTHS);
        assert_eq!(timeline.len(), 25);
        assert_eq!(timeline.month(24), Some(date(2027, 3, 1)));
    }

    #[test]
    fn end_before_start_collapses_to_single_period() {
        let timeline = Timeline::monthly(
            date(2025, 6, 10),
            Some(date(2024, 2, 1)),
            DEFAULT_FALLBACK_HORIZON_MONTHS,
        );
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.month(0), Some(date(2025, 6, 1)));
    }

    #[test]
    fn periods_are_contiguous_months() {
        let timeline = Timeline::monthly(date(2024, 11, 1), Some(date(2025, 3, 1)), 24);
        let labels = timeline.labels();
        assert_eq!(labels, vec!["2024-11", "2024-12", "2025-01", "2025-02", "2025-03"]);
        let indexes: Vec<usize> = timeline.periods().map(|period| period.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
    }
}
