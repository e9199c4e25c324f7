//! Named reporting periods and the date windows they resolve to.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A reporting period, relative to "now" unless custom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    /// The last 7 days.
    ThisWeek,
    /// The last calendar month.
    ThisMonth,
    /// The last 12 calendar months.
    ThisYear,
    /// Explicit bounds, both inclusive. Not validated.
    Custom {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },
}

impl Period {
    /// Resolves the period against the current time.
    #[inline]
    #[must_use]
    pub fn resolve(self) -> DateRange {
        self.resolve_at(Utc::now())
    }

    /// Resolves the period against `now`.
    ///
    /// Relative periods end at `now`. Month arithmetic clamps to the last
    /// valid day (Mar 31 minus one month is Feb 29 or 28).
    #[inline]
    #[must_use]
    pub fn resolve_at(self, now: DateTime<Utc>) -> DateRange {
        let start = match self {
            Self::ThisWeek => now
                .checked_sub_signed(TimeDelta::days(7))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::ThisMonth => months_back(now, 1),
            Self::ThisYear => months_back(now, 12),
            Self::Custom { start, end } => return DateRange { start, end },
        };
        DateRange { start, end: now }
    }
}

/// `now` minus `months` calendar months, saturating at the earliest
/// representable instant.
fn months_back(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// An inclusive window of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First instant in the window.
    pub start: DateTime<Utc>,
    /// Last instant in the window.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a window. An inverted window contains nothing.
    #[inline]
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns `true` if `instant` lies within the window.
    #[inline]
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Length of the window. Zero for an inverted window.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        (self.end - self.start).max(TimeDelta::zero())
    }

    /// The window of the same length that ends just before `start`.
    ///
    /// Used to compare a period against the one before it. The two
    /// windows never overlap.
    #[inline]
    #[must_use]
    pub fn preceding(&self) -> Self {
        let end = self
            .start
            .checked_sub_signed(TimeDelta::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let start = end
            .checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn week_is_seven_days() {
        let now = at(2024, 5, 10);
        let range = Period::ThisWeek.resolve_at(now);
        assert_eq!(range.start, at(2024, 5, 3));
        assert_eq!(range.end, now);
    }

    #[test]
    fn month_clamps_to_month_end() {
        let range = Period::ThisMonth.resolve_at(at(2024, 3, 31));
        assert_eq!(range.start, at(2024, 2, 29));
    }

    #[test]
    fn year_is_twelve_months() {
        let range = Period::ThisYear.resolve_at(at(2024, 2, 29));
        assert_eq!(range.start, at(2023, 2, 28));
    }

    #[test]
    fn custom_passes_bounds_through() {
        let range = Period::Custom {
            start: at(2024, 6, 1),
            end: at(2024, 1, 1),
        }
        .resolve_at(at(2030, 1, 1));
        assert_eq!(range.start, at(2024, 6, 1));
        assert!(!range.contains(at(2024, 3, 1)));
        assert_eq!(range.duration(), TimeDelta::zero());
    }

    #[test]
    fn contains_is_inclusive() {
        let range = DateRange::new(at(2024, 1, 1), at(2024, 1, 31));
        assert!(range.contains(at(2024, 1, 1)));
        assert!(range.contains(at(2024, 1, 31)));
        assert!(!range.contains(at(2024, 2, 1)));
    }

    #[test]
    fn preceding_is_adjacent_and_same_length() {
        let range = Period::ThisWeek.resolve_at(at(2024, 5, 10));
        let previous = range.preceding();
        assert!(previous.end < range.start);
        assert_eq!(range.start - previous.end, TimeDelta::nanoseconds(1));
        assert_eq!(previous.duration(), range.duration());
        assert!(!previous.contains(range.start));
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&Period::ThisMonth).unwrap();
        assert_eq!(json, "\"thisMonth\"");
    }
}
