//! Read-only window projections for dashboard display. Occurrences that
//! already passed `now` should exist as real ledger entries, so the split
//! keeps them out of the forward-looking total instead of double-counting.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::obligation::{Classification, Obligation};
use crate::schedule::{enumerate, DateWindow};

/// One concrete firing of a rule, before it becomes a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub classification: Classification,
}

/// Unsigned per-classification totals plus the occurrence count behind them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub saving: Decimal,
    pub debt: Decimal,
    pub occurrences: usize,
}

impl ClassTotals {
    fn add(&mut self, occurrence: &Occurrence) {
        match occurrence.classification {
            Classification::Income => self.income += occurrence.amount,
            Classification::Expense => self.expense += occurrence.amount,
            Classification::Saving => self.saving += occurrence.amount,
            Classification::Debt => self.debt += occurrence.amount,
        }
        self.occurrences += 1;
    }

    /// Net with signs applied: income positive, everything else negative.
    /// Keeping the sign out of the stored magnitudes avoids the
    /// double-negation traps of ambiguously signed amounts.
    pub fn signed_net(&self) -> Decimal {
        self.income - self.expense - self.saving - self.debt
    }
}

/// Projection of scheduled occurrences over a window, split against `now`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastReport {
    /// Occurrences dated before `now`; informational only.
    pub past: ClassTotals,
    /// Occurrences still ahead inside the window; what "previsto" adds to
    /// the current balance.
    pub pending: ClassTotals,
    /// Set when any rule hit the enumeration cap; the report is partial.
    pub truncated: bool,
}

/// Projects every schedulable obligation over `window`. Read-only and safe
/// to run concurrently with materialization sweeps. An obligation with a
/// broken rule is skipped (and logged), never allowed to abort the rest.
pub fn project(obligations: &[Obligation], window: DateWindow, now: NaiveDate) -> ForecastReport {
    let mut report = ForecastReport::default();
    for obligation in obligations.iter().filter(|o| o.is_schedulable()) {
        let enumeration = match enumerate(&obligation.rule, window) {
            Ok(enumeration) => enumeration,
            Err(err) => {
                warn!(obligation = %obligation.id, %err, "skipping obligation in forecast");
                continue;
            }
        };
        report.truncated |= enumeration.truncated;
        for date in enumeration.dates {
            let occurrence = Occurrence {
                date,
                amount: obligation.amount,
                classification: obligation.classification,
            };
            if date < now {
                report.past.add(&occurrence);
            } else {
                report.pending.add(&occurrence);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligation::ConfirmationMode;
    use crate::schedule::{Frequency, RecurrenceRule};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn obligation(
        amount: Decimal,
        classification: Classification,
        rule: RecurrenceRule,
    ) -> Obligation {
        Obligation::new(
            "Test",
            amount,
            classification,
            rule,
            ConfirmationMode::Automatic,
        )
        .unwrap()
    }

    #[test]
    fn split_excludes_past_occurrences_from_pending() {
        // Monthly expense anchored Oct 1; by Oct 10 the only October firing
        // is already past, so pending is zero and past records it.
        let obligations = vec![obligation(
            dec!(50),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Monthly, date(2025, 10, 1)),
        )];
        let window = DateWindow::new(date(2025, 10, 1), date(2025, 10, 31)).unwrap();
        let report = project(&obligations, window, date(2025, 10, 10));
        assert_eq!(report.pending.expense, Decimal::ZERO);
        assert_eq!(report.pending.occurrences, 0);
        assert_eq!(report.past.expense, dec!(50));
        assert_eq!(report.past.occurrences, 1);
    }

    #[test]
    fn occurrence_on_now_counts_as_pending() {
        let obligations = vec![obligation(
            dec!(50),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Monthly, date(2025, 10, 10)),
        )];
        let window = DateWindow::new(date(2025, 10, 1), date(2025, 10, 31)).unwrap();
        let report = project(&obligations, window, date(2025, 10, 10));
        assert_eq!(report.pending.expense, dec!(50));
        assert_eq!(report.past.occurrences, 0);
    }

    #[test]
    fn totals_accumulate_per_classification() {
        let obligations = vec![
            obligation(
                dec!(3000),
                Classification::Income,
                RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 1)),
            ),
            obligation(
                dec!(1200),
                Classification::Expense,
                RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 5)),
            ),
            obligation(
                dec!(400),
                Classification::Saving,
                RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 10)),
            ),
            obligation(
                dec!(250),
                Classification::Debt,
                RecurrenceRule::new(Frequency::Monthly, date(2025, 1, 15)),
            ),
        ];
        let window = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        let report = project(&obligations, window, date(2025, 1, 1));
        assert_eq!(report.pending.income, dec!(3000));
        assert_eq!(report.pending.expense, dec!(1200));
        assert_eq!(report.pending.saving, dec!(400));
        assert_eq!(report.pending.debt, dec!(250));
        assert_eq!(report.pending.signed_net(), dec!(1150));
    }

    #[test]
    fn inactive_and_suspended_obligations_are_excluded() {
        let mut inactive = obligation(
            dec!(10),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Daily, date(2025, 1, 1)),
        );
        inactive.is_active = false;
        let mut suspended = obligation(
            dec!(10),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Daily, date(2025, 1, 1)),
        );
        suspended.suspend("broken target");

        let window = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        let report = project(&[inactive, suspended], window, date(2025, 1, 1));
        assert_eq!(report.pending.occurrences, 0);
        assert_eq!(report.past.occurrences, 0);
    }

    #[test]
    fn broken_rule_is_skipped_without_aborting() {
        let mut broken = obligation(
            dec!(10),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Daily, date(2025, 6, 1)),
        );
        broken.rule.end_date = Some(date(2025, 1, 1));
        let healthy = obligation(
            dec!(20),
            Classification::Income,
            RecurrenceRule::new(Frequency::OneTime, date(2025, 1, 15)),
        );

        let window = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        let report = project(&[broken, healthy], window, date(2025, 1, 1));
        assert_eq!(report.pending.income, dec!(20));
        assert_eq!(report.pending.expense, Decimal::ZERO);
    }

    #[test]
    fn truncation_flag_surfaces_in_the_report() {
        let obligations = vec![obligation(
            dec!(1),
            Classification::Expense,
            RecurrenceRule::new(Frequency::Daily, date(2025, 1, 1)),
        )];
        let window = DateWindow::new(date(2025, 1, 1), date(2035, 1, 1)).unwrap();
        let report = project(&obligations, window, date(2025, 1, 1));
        assert!(report.truncated);
    }
}
