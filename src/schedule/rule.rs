use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::frequency::Frequency;
use crate::errors::{PlannerError, Result};

/// Describes how an obligation repeats. `anchor` is the schedule cursor: the
/// next date at which the rule fires, advanced exactly once per occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub anchor: NaiveDate,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub remaining_repeats: Option<u32>,
}

impl RecurrenceRule {
    /// Creates an unbounded rule whose anchor starts at `start_date`.
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency,
            anchor: start_date,
            start_date,
            end_date: None,
            repeat_count: None,
            remaining_repeats: None,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Caps the rule at `count` future occurrences.
    pub fn with_repeat_count(mut self, count: u32) -> Self {
        self.repeat_count = Some(count);
        self.remaining_repeats = Some(count);
        self
    }

    /// Rejects malformed rules before they reach enumeration or a sweep.
    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.end_date {
            if self.start_date > end {
                return Err(PlannerError::RuleIntegrity(format!(
                    "start date {} is after end date {}",
                    self.start_date, end
                )));
            }
        }
        if self.anchor < self.start_date {
            return Err(PlannerError::RuleIntegrity(format!(
                "anchor {} precedes start date {}",
                self.anchor, self.start_date
            )));
        }
        Ok(())
    }

    /// Computes the anchor following `from`, or `None` when the schedule is
    /// exhausted (a one-time rule fired, or the next step passes `end_date`).
    pub fn next_anchor(&self, from: NaiveDate) -> Option<NaiveDate> {
        let next = self.frequency.next_date(from)?;
        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    /// True once no further occurrence can fire.
    pub fn is_exhausted(&self) -> bool {
        if matches!(self.remaining_repeats, Some(0)) {
            return true;
        }
        match self.end_date {
            Some(end) => self.anchor > end,
            None => false,
        }
    }
}
