use chrono::NaiveDate;

use super::{DateWindow, RecurrenceRule};
use crate::errors::Result;

/// Hard cap on enumeration steps, independent of the rule's own bounds. A
/// corrupt rule (an end date centuries out) must cost bounded work per
/// request; hitting the cap marks the result truncated instead of silently
/// dropping occurrences.
pub const MAX_ENUMERATION_STEPS: usize = 500;

/// Outcome of enumerating a rule inside a window. Dates only: amount and
/// classification live on the obligation, so the forecast layer pairs each
/// date with them to form full occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub dates: Vec<NaiveDate>,
    pub truncated: bool,
}

/// Enumerates the dates on which `rule` fires inside `window`, both ends
/// inclusive. Pure: identical inputs always yield the identical sequence.
///
/// The cursor starts at `rule.anchor` and is never clamped forward to the
/// window start; steps falling before the window are walked past, not
/// skipped, so past-due occurrences keep their place in the sequence. The
/// walk stops at the window end, the rule's end date, its remaining-repeat
/// budget, or the hard step cap, whichever comes first.
pub fn enumerate(rule: &RecurrenceRule, window: DateWindow) -> Result<Enumeration> {
    rule.validate()?;

    let mut result = Enumeration::default();
    let mut cursor = rule.anchor;
    let mut budget = rule.remaining_repeats;
    let mut steps = 0usize;

    loop {
        if cursor > window.end {
            break;
        }
        if let Some(end) = rule.end_date {
            if cursor > end {
                break;
            }
        }
        if matches!(budget, Some(0)) {
            break;
        }
        if steps >= MAX_ENUMERATION_STEPS {
            result.truncated = true;
            break;
        }
        if window.contains(cursor) {
            result.dates.push(cursor);
        }
        if let Some(remaining) = budget.as_mut() {
            *remaining -= 1;
        }
        steps += 1;
        match rule.frequency.next_date(cursor) {
            Some(next) => cursor = next,
            // One-time rules never step.
            None => break,
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Frequency;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).unwrap()
    }

    #[test]
    fn enumeration_is_deterministic() {
        let rule = RecurrenceRule::new(Frequency::Weekly, date(2025, 1, 6));
        let w = window(date(2025, 1, 1), date(2025, 3, 1));
        let first = enumerate(&rule, w).unwrap();
        let second = enumerate(&rule, w).unwrap();
        assert_eq!(first, second);
        assert!(!first.dates.is_empty());
    }

    #[test]
    fn every_date_is_inside_the_window() {
        let rule = RecurrenceRule::new(Frequency::Daily, date(2024, 12, 20));
        let w = window(date(2025, 1, 1), date(2025, 1, 10));
        let result = enumerate(&rule, w).unwrap();
        assert_eq!(result.dates.len(), 10);
        assert!(result.dates.iter().all(|d| w.contains(*d)));
    }

    #[test]
    fn anchor_is_not_clamped_forward_to_the_window() {
        // A monthly rule anchored on the 10th with a window starting
        // mid-cycle: the walk starts at the anchor, so the in-window hits
        // stay on the 10th.
        let rule = RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 10));
        let w = window(date(2025, 3, 1), date(2025, 5, 31));
        let result = enumerate(&rule, w).unwrap();
        assert_eq!(
            result.dates,
            vec![date(2025, 3, 10), date(2025, 4, 10), date(2025, 5, 10)]
        );
    }

    #[test]
    fn monthly_rule_clamps_at_february() {
        let rule = RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 31));
        let w = window(date(2025, 1, 1), date(2025, 4, 30));
        let result = enumerate(&rule, w).unwrap();
        assert_eq!(
            result.dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 28),
                date(2025, 4, 28),
            ]
        );
        assert!(!result.truncated);
    }

    #[test]
    fn one_time_rule_yields_exactly_one_date() {
        let rule = RecurrenceRule::new(Frequency::OneTime, date(2025, 6, 15));
        let w = window(date(2025, 1, 1), date(2025, 12, 31));
        let result = enumerate(&rule, w).unwrap();
        assert_eq!(result.dates, vec![date(2025, 6, 15)]);

        let outside = window(date(2026, 1, 1), date(2026, 12, 31));
        assert!(enumerate(&rule, outside).unwrap().dates.is_empty());
    }

    #[test]
    fn repeat_budget_caps_the_sequence() {
        let rule =
            RecurrenceRule::new(Frequency::Daily, date(2025, 1, 1)).with_repeat_count(3);
        let w = window(date(2025, 1, 1), date(2025, 12, 31));
        let result = enumerate(&rule, w).unwrap();
        assert_eq!(
            result.dates,
            vec![date(2025, 1, 1), date(2025, 1, 2), date(2025, 1, 3)]
        );
    }

    #[test]
    fn hundred_year_window_terminates_and_flags_truncation() {
        let rule = RecurrenceRule::new(Frequency::Yearly, date(2025, 1, 1));
        let w = window(date(2025, 1, 1), date(2125, 1, 1));
        let result = enumerate(&rule, w).unwrap();
        assert!(result.dates.len() <= MAX_ENUMERATION_STEPS);
        assert_eq!(result.dates.len(), 101);
        assert!(!result.truncated);

        let daily = RecurrenceRule::new(Frequency::Daily, date(2025, 1, 1));
        let capped = enumerate(&daily, w).unwrap();
        assert_eq!(capped.dates.len(), MAX_ENUMERATION_STEPS);
        assert!(capped.truncated);
    }

    #[test]
    fn invalid_rule_errors_instead_of_yielding_empty() {
        let rule = RecurrenceRule::new(Frequency::Monthly, date(2025, 6, 1))
            .with_end_date(date(2025, 1, 1));
        let w = window(date(2025, 1, 1), date(2025, 12, 31));
        assert!(enumerate(&rule, w).is_err());
    }
}
