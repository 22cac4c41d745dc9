use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::PlannerError;

/// How often an obligation fires. The set is closed: any other value is a
/// data-integrity error at the boundary, never a silently defaulted case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Semiannual,
    Yearly,
    OneTime,
}

impl Frequency {
    fn step_months(self) -> Option<i32> {
        match self {
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::Semiannual => Some(6),
            Frequency::Yearly => Some(12),
            _ => None,
        }
    }

    /// Advances `from` by one step of this frequency; `OneTime` never steps.
    ///
    /// Month-family steps keep the day-of-month where the target month allows
    /// it and clamp to the month's last day otherwise (Jan 31 -> Feb 28/29).
    /// The following step computes from the clamped date, so a rule anchored
    /// on the 31st drifts to month-end after crossing a short month.
    pub fn next_date(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => Some(from + Duration::days(1)),
            Frequency::Weekly => Some(from + Duration::days(7)),
            Frequency::OneTime => None,
            _ => self.step_months().map(|months| shift_month(from, months)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Semiannual => "SEMIANNUAL",
            Frequency::Yearly => "YEARLY",
            Frequency::OneTime => "ONE_TIME",
        };
        f.write_str(token)
    }
}

impl FromStr for Frequency {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "SEMIANNUAL" => Ok(Frequency::Semiannual),
            "YEARLY" => Ok(Frequency::Yearly),
            "ONE_TIME" => Ok(Frequency::OneTime),
            other => Err(PlannerError::RuleIntegrity(format!(
                "unknown frequency value: {other}"
            ))),
        }
    }
}

fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}
