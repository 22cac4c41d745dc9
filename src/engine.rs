//! The materialization state machine: SCHEDULED -> DUE -> one of
//! MATERIALIZED, AWAITING_CONFIRMATION, or FAILED. Every transition is one
//! atomic unit against the store's compare-and-swap, so a ledger write and
//! its anchor advance succeed together or not at all.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{PlannerError, Result};
use crate::obligation::{ConfirmationMode, Obligation};
use crate::sink::{LedgerEntry, LedgerSink};
use crate::store::ObligationStore;

/// Outcome of driving one obligation through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializationResult {
    /// Entry posted and the schedule advanced. `new_anchor` is `None` when
    /// the rule is now exhausted and the obligation went terminal.
    Materialized {
        entry_id: Uuid,
        new_anchor: Option<NaiveDate>,
    },
    /// A manual obligation is due; nothing was written and nothing moved.
    AwaitingConfirmation { date: NaiveDate },
    /// The target resource was invalid. The anchor still advanced and the
    /// obligation was suspended, so the next sweep does not rediscover the
    /// same occurrence.
    Failed { date: NaiveDate, reason: String },
}

/// Per-obligation outcome counts for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub materialized: usize,
    pub awaiting_confirmation: usize,
    pub failed: usize,
    /// Lost races and per-obligation errors; the next sweep picks up any
    /// still-due state.
    pub skipped: usize,
}

/// Drives due obligations into the ledger. Evaluation is caller-invoked and
/// safe to run repeatedly and concurrently: at-most-once materialization
/// rests on the store's compare-and-swap plus the sink's naturally-keyed
/// idempotent append.
pub struct MaterializationEngine<S, K> {
    store: S,
    sink: K,
}

impl<S: ObligationStore, K: LedgerSink> MaterializationEngine<S, K> {
    pub fn new(store: S, sink: K) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Obligations due as of `now`, excluding suspended ones and rules that
    /// fail integrity validation.
    pub fn list_due(&self, now: NaiveDate) -> Result<Vec<Obligation>> {
        let mut due = Vec::new();
        for obligation in self.store.list_due(now)? {
            if let Err(err) = obligation.rule.validate() {
                warn!(obligation = %obligation.id, %err, "excluding obligation with broken rule from due sweep");
                continue;
            }
            due.push(obligation);
        }
        Ok(due)
    }

    /// Runs one state transition for a due obligation. Idempotent under
    /// retry: once the occurrence is resolved the obligation is no longer
    /// due for it, and a lost race surfaces as `ConcurrentModification`
    /// without a second ledger write.
    pub fn materialize_due(&self, id: Uuid, now: NaiveDate) -> Result<MaterializationResult> {
        let obligation = self.store.get(id)?;
        if !obligation.is_due(now) {
            return Err(PlannerError::NotDue { id });
        }
        obligation.rule.validate()?;
        match obligation.confirmation {
            ConfirmationMode::Manual => {
                debug!(obligation = %id, date = %obligation.rule.anchor, "due obligation awaits confirmation");
                Ok(MaterializationResult::AwaitingConfirmation {
                    date: obligation.rule.anchor,
                })
            }
            ConfirmationMode::Automatic => self.post_occurrence(obligation),
        }
    }

    /// Confirms a manual obligation's pending occurrence, materializing it
    /// exactly as an automatic rule would.
    pub fn confirm(&self, id: Uuid, now: NaiveDate) -> Result<MaterializationResult> {
        let obligation = self.store.get(id)?;
        if obligation.confirmation != ConfirmationMode::Manual {
            return Err(PlannerError::NotManual { id });
        }
        if !obligation.is_due(now) {
            return Err(PlannerError::NotDue { id });
        }
        obligation.rule.validate()?;
        self.post_occurrence(obligation)
    }

    /// Skips a manual obligation's pending occurrence: the anchor advances,
    /// nothing posts to the ledger. Returns the new anchor, or `None` when
    /// the rule is exhausted.
    pub fn skip(&self, id: Uuid, now: NaiveDate) -> Result<Option<NaiveDate>> {
        let mut obligation = self.store.get(id)?;
        if obligation.confirmation != ConfirmationMode::Manual {
            return Err(PlannerError::NotManual { id });
        }
        if !obligation.is_due(now) {
            return Err(PlannerError::NotDue { id });
        }
        obligation.rule.validate()?;
        let expected = obligation.version;
        let date = obligation.rule.anchor;
        obligation.advance_schedule();
        let new_anchor = obligation.is_active.then_some(obligation.rule.anchor);
        self.store.compare_and_update(expected, obligation)?;
        info!(obligation = %id, %date, "skipped pending occurrence");
        Ok(new_anchor)
    }

    /// Sweeps every due obligation independently: one obligation's failure
    /// or lost race never aborts the others. Only store/sink connectivity
    /// errors are fatal to the sweep.
    pub fn sweep_due(&self, now: NaiveDate) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        for obligation in self.list_due(now)? {
            match self.materialize_due(obligation.id, now) {
                Ok(MaterializationResult::Materialized { .. }) => report.materialized += 1,
                Ok(MaterializationResult::AwaitingConfirmation { .. }) => {
                    report.awaiting_confirmation += 1
                }
                Ok(MaterializationResult::Failed { .. }) => report.failed += 1,
                Err(PlannerError::Storage(message)) => {
                    return Err(PlannerError::Storage(message));
                }
                Err(err) => {
                    // Another sweep got there first, or this one obligation
                    // is unprocessable; carry on with the rest.
                    debug!(obligation = %obligation.id, %err, "obligation skipped during sweep");
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }

    fn post_occurrence(&self, mut obligation: Obligation) -> Result<MaterializationResult> {
        let id = obligation.id;
        let expected = obligation.version;
        let date = obligation.rule.anchor;

        // Any resolution failure, unavailable resource or lookup error, is a
        // FAILED transition rather than a retry.
        if let Err(err) = self.sink.resolve_resource(obligation.target_ref) {
            // The cursor must move even though nothing posts; leaving the
            // obligation due would make every later sweep rediscover the
            // same occurrence.
            let reason = err.to_string();
            obligation.advance_schedule();
            obligation.suspend(reason.clone());
            self.store.compare_and_update(expected, obligation)?;
            warn!(obligation = %id, %date, %reason, "materialization failed; obligation suspended");
            return Ok(MaterializationResult::Failed { date, reason });
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            obligation_id: id,
            date,
            amount: obligation.amount,
            classification: obligation.classification,
            target_ref: obligation.target_ref,
        };
        // Append is idempotent on (obligation, date): if the CAS below loses
        // a race, the winner already posted this same occurrence and the
        // duplicate write was a no-op.
        let entry_id = self.sink.append(entry)?;
        obligation.advance_schedule();
        let new_anchor = obligation.is_active.then_some(obligation.rule.anchor);
        self.store.compare_and_update(expected, obligation)?;
        info!(obligation = %id, %date, entry = %entry_id, "materialized occurrence");
        Ok(MaterializationResult::Materialized {
            entry_id,
            new_anchor,
        })
    }
}
