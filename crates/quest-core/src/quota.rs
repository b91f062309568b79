//! Daily quota gate for voice-grading attempts.
//!
//! The counter is a plain `(date, count)` value passed in and returned by
//! pure functions; persistence is the caller's concern (see
//! `ports::QuotaStore`). The count is only meaningful for the stored day:
//! when the stored date differs from today, the effective count is zero.
//! That lazy reset means no scheduled rollover pass is ever needed.
//!
//! The gate is advisory. It lives in device-local state the end user can
//! trivially clear, which is intentional: it throttles a child's grading
//! attempts, it is not a security boundary.

use chrono::NaiveDate;
use quest_types::QuotaCounter;

/// Default number of grading attempts allowed per calendar day.
pub const DEFAULT_DAILY_LIMIT: u32 = 3;

/// The attempts already spent today, treating a stale date as zero.
pub fn effective_count(counter: QuotaCounter, today: NaiveDate) -> u32 {
    if counter.date == today { counter.count } else { 0 }
}

/// True while fewer than `limit` attempts have been spent today.
pub fn can_attempt(counter: QuotaCounter, today: NaiveDate, limit: u32) -> bool {
    effective_count(counter, today) < limit
}

/// Record one attempt: bump the effective count and stamp today's date.
#[must_use]
pub fn record_attempt(counter: QuotaCounter, today: NaiveDate) -> QuotaCounter {
    QuotaCounter {
        date: today,
        count: effective_count(counter, today).saturating_add(1),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn allows_exactly_limit_attempts_per_day() {
        let today = day(2025, 1, 1);
        let mut counter = QuotaCounter::fresh(today);

        for _ in 0..DEFAULT_DAILY_LIMIT {
            assert!(can_attempt(counter, today, DEFAULT_DAILY_LIMIT));
            counter = record_attempt(counter, today);
        }
        assert!(!can_attempt(counter, today, DEFAULT_DAILY_LIMIT));
        assert_eq!(counter.count, DEFAULT_DAILY_LIMIT);
    }

    #[test]
    fn crossing_midnight_resets_lazily() {
        // Exhausted on January 1st...
        let exhausted = QuotaCounter {
            date: day(2025, 1, 1),
            count: 3,
        };
        assert!(!can_attempt(exhausted, day(2025, 1, 1), 3));

        // ...but the same stored counter permits attempts on the 2nd
        // without any explicit reset call.
        assert!(can_attempt(exhausted, day(2025, 1, 2), 3));
        assert_eq!(effective_count(exhausted, day(2025, 1, 2)), 0);

        let after = record_attempt(exhausted, day(2025, 1, 2));
        assert_eq!(after.date, day(2025, 1, 2));
        assert_eq!(after.count, 1);
    }

    #[test]
    fn stale_counter_from_any_prior_day_counts_as_zero() {
        let old = QuotaCounter {
            date: day(2024, 11, 30),
            count: 99,
        };
        assert_eq!(effective_count(old, day(2025, 1, 1)), 0);
        assert!(can_attempt(old, day(2025, 1, 1), 1));
    }
}
