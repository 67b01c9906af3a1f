//! Next-appointment scheduling.

use chrono::{Months, NaiveDate};
use clinic_types::Branch;

use crate::calendar::CalendarPolicy;
use crate::{ClinicError, ClinicResult};

/// Upper bound on one-day advances when searching for an open day.
///
/// Guards against configurations where every day is closed. When the bound
/// is exhausted the last candidate is returned even though it may still be
/// closed; callers display it as-is.
pub const MAX_DAY_ADVANCES: usize = 60;

/// Computes the next appointment date `months_ahead` calendar months after
/// `base`, then advances day by day past Sundays and closed days.
///
/// Month addition uses calendar arithmetic: the day-of-month is preserved
/// and clamped to the end of the target month (Jan 31 + 1 month = Feb 28).
/// Callers that already hold an explicit date skip this computation
/// entirely.
pub fn next_appointment(
    policy: &CalendarPolicy,
    base: NaiveDate,
    months_ahead: u32,
    branch: Branch,
) -> ClinicResult<NaiveDate> {
    let mut candidate = base
        .checked_add_months(Months::new(months_ahead))
        .ok_or_else(|| {
            ClinicError::DateOutOfRange(format!("{base} plus {months_ahead} months"))
        })?;

    let mut advances = 0;
    while policy.is_closed(candidate, branch) && advances < MAX_DAY_ADVANCES {
        let Some(next) = candidate.succ_opt() else {
            break;
        };
        candidate = next;
        advances += 1;
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ClosedDay, ClosedSpan};
    use chrono::{Datelike, Weekday};
    use clinic_types::BranchScope;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry(span: ClosedSpan, branch: BranchScope) -> ClosedDay {
        ClosedDay {
            span,
            branch,
            reason: String::new(),
            created_at: "2025-09-01T00:00:00Z".parse().expect("valid timestamp"),
        }
    }

    #[test]
    fn test_lands_on_open_day_unchanged() {
        let policy = CalendarPolicy::new(vec![]);
        // 2025-09-30 + 1 month = 2025-10-30, a Thursday.
        let result =
            next_appointment(&policy, date(2025, 9, 30), 1, Branch::Malad).expect("schedule");
        assert_eq!(result, date(2025, 10, 30));
    }

    #[test]
    fn test_skips_sunday() {
        let policy = CalendarPolicy::new(vec![]);
        // 2025-10-02 + 1 month = 2025-11-02, a Sunday.
        let base = date(2025, 10, 2);
        assert_eq!(date(2025, 11, 2).weekday(), Weekday::Sun);
        let result = next_appointment(&policy, base, 1, Branch::Borivali).expect("schedule");
        assert_eq!(result, date(2025, 11, 3));
    }

    #[test]
    fn test_skips_closure_then_sunday_runs() {
        // Candidate lands on 2025-10-30, closed for Malad; 10-31 and 11-01
        // closed for everyone; 11-02 is a Sunday: first open day is 11-03.
        let policy = CalendarPolicy::new(vec![
            entry(
                ClosedSpan::Single {
                    date: date(2025, 10, 30),
                },
                BranchScope::Only(Branch::Malad),
            ),
            entry(
                ClosedSpan::Range {
                    date_from: date(2025, 10, 31),
                    date_to: date(2025, 11, 1),
                },
                BranchScope::All,
            ),
        ]);
        let result =
            next_appointment(&policy, date(2025, 9, 30), 1, Branch::Malad).expect("schedule");
        assert_eq!(result, date(2025, 11, 3));

        // Borivali is not affected by the Malad-only closure.
        let result =
            next_appointment(&policy, date(2025, 9, 30), 1, Branch::Borivali).expect("schedule");
        assert_eq!(result, date(2025, 10, 30));
    }

    #[test]
    fn test_month_end_clamps() {
        let policy = CalendarPolicy::new(vec![]);
        // Jan 31 + 1 month clamps to Feb 28 (2025 is not a leap year),
        // which is a Friday.
        let result =
            next_appointment(&policy, date(2025, 1, 31), 1, Branch::Bhayander).expect("schedule");
        assert_eq!(result, date(2025, 2, 28));
    }

    #[test]
    fn test_result_is_open_unless_bound_exhausted() {
        let policy = CalendarPolicy::new(vec![entry(
            ClosedSpan::Range {
                date_from: date(2025, 10, 1),
                date_to: date(2025, 10, 20),
            },
            BranchScope::All,
        )]);
        let result =
            next_appointment(&policy, date(2025, 9, 1), 1, Branch::Malad).expect("schedule");
        assert!(!policy.is_closed(result, Branch::Malad));
    }

    #[test]
    fn test_safety_bound_returns_last_candidate() {
        // Every day for years is closed: the search gives up after
        // MAX_DAY_ADVANCES increments and returns a still-closed date.
        let policy = CalendarPolicy::new(vec![entry(
            ClosedSpan::Range {
                date_from: date(2025, 1, 1),
                date_to: date(2030, 12, 31),
            },
            BranchScope::All,
        )]);
        let result =
            next_appointment(&policy, date(2025, 9, 30), 1, Branch::Malad).expect("schedule");
        let expected = date(2025, 10, 30) + chrono::Duration::days(MAX_DAY_ADVANCES as i64);
        assert_eq!(result, expected);
        assert!(policy.is_closed(result, Branch::Malad));
    }
}
