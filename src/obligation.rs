use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PlannerError, Result};
use crate::schedule::RecurrenceRule;

/// Classifies an obligation's cash-flow direction. Amounts stay unsigned;
/// the sign is derived from the classification when a net is computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Classification {
    Income,
    Expense,
    Saving,
    Debt,
}

/// Whether a due occurrence posts to the ledger without user input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfirmationMode {
    Automatic,
    Manual,
}

/// A recurring financial commitment (salary, subscription, installment)
/// tracked by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Obligation {
    pub id: Uuid,
    pub name: String,
    /// Unsigned magnitude; direction comes from `classification`.
    pub amount: Decimal,
    pub classification: Classification,
    pub rule: RecurrenceRule,
    pub confirmation: ConfirmationMode,
    pub is_active: bool,
    /// Set when a materialization failed; excluded from sweeps and forecasts
    /// until a collaborator clears it.
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub last_failure: Option<String>,
    /// Resolved by the ledger sink (e.g. an account id); may be unassigned.
    #[serde(default)]
    pub target_ref: Option<Uuid>,
    /// Optimistic-concurrency counter, bumped on every schedule advance.
    #[serde(default)]
    pub version: u64,
}

impl Obligation {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        classification: Classification,
        rule: RecurrenceRule,
        confirmation: ConfirmationMode,
    ) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(PlannerError::InvalidAmount(format!(
                "amount must be a non-negative magnitude, got {amount}"
            )));
        }
        rule.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            classification,
            rule,
            confirmation,
            is_active: true,
            suspended: false,
            last_failure: None,
            target_ref: None,
            version: 0,
        })
    }

    pub fn with_target(mut self, target: Uuid) -> Self {
        self.target_ref = Some(target);
        self
    }

    /// Whether the obligation participates in forecasts and due sweeps.
    pub fn is_schedulable(&self) -> bool {
        self.is_active && !self.suspended
    }

    /// True once no further occurrence can fire: the repeat budget is spent,
    /// the end date has passed, or a collaborator deactivated the
    /// obligation. Checked independently of `is_active` because snapshots
    /// and collaborator writes can leave exhausted rules with the active
    /// flag still set.
    pub fn is_terminal(&self) -> bool {
        !self.is_active || self.rule.is_exhausted()
    }

    pub fn is_due(&self, now: NaiveDate) -> bool {
        self.is_schedulable() && !self.is_terminal() && self.rule.anchor <= now
    }

    /// Moves the schedule cursor past the occurrence that was just resolved,
    /// spending one bounded repeat and bumping the version. Flips the
    /// obligation terminal when the rule has nothing further to fire.
    pub fn advance_schedule(&mut self) {
        if let Some(remaining) = self.rule.remaining_repeats.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        match self.rule.next_anchor(self.rule.anchor) {
            Some(next) => self.rule.anchor = next,
            None => self.is_active = false,
        }
        if self.rule.is_exhausted() {
            self.is_active = false;
        }
        self.version += 1;
    }

    /// Takes the obligation out of sweeps after a failed materialization.
    pub fn suspend(&mut self, reason: impl Into<String>) {
        self.suspended = true;
        self.last_failure = Some(reason.into());
    }
}
