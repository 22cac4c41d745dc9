use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::{PlannerError, Result};
use crate::obligation::Obligation;

/// Persistence contract for obligations. Updates are optimistic: a writer
/// passes the version it read and loses cleanly when the stored version has
/// moved on.
pub trait ObligationStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Obligation>;
    fn list(&self) -> Result<Vec<Obligation>>;
    fn insert(&self, obligation: Obligation) -> Result<()>;

    /// Replaces the stored obligation only while its version still equals
    /// `expected_version`; otherwise fails with `ConcurrentModification`.
    fn compare_and_update(&self, expected_version: u64, obligation: Obligation) -> Result<()>;

    /// Obligations whose anchor has come due as of `now`.
    fn list_due(&self, now: NaiveDate) -> Result<Vec<Obligation>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|obligation| obligation.is_due(now))
            .collect())
    }
}

/// In-memory store with mutex-guarded compare-and-swap semantics, used for
/// embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    obligations: Mutex<HashMap<Uuid, Obligation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from a snapshot, e.g. one loaded from disk.
    pub fn with_obligations(obligations: Vec<Obligation>) -> Self {
        let map = obligations
            .into_iter()
            .map(|obligation| (obligation.id, obligation))
            .collect();
        Self {
            obligations: Mutex::new(map),
        }
    }
}

impl ObligationStore for MemoryStore {
    fn get(&self, id: Uuid) -> Result<Obligation> {
        self.obligations
            .lock()
            .map_err(|_| poisoned())?
            .get(&id)
            .cloned()
            .ok_or(PlannerError::NotFound { id })
    }

    fn list(&self) -> Result<Vec<Obligation>> {
        let mut all: Vec<Obligation> = self
            .obligations
            .lock()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|obligation| (obligation.rule.anchor, obligation.id));
        Ok(all)
    }

    fn insert(&self, obligation: Obligation) -> Result<()> {
        self.obligations
            .lock()
            .map_err(|_| poisoned())?
            .insert(obligation.id, obligation);
        Ok(())
    }

    fn compare_and_update(&self, expected_version: u64, obligation: Obligation) -> Result<()> {
        let mut map = self.obligations.lock().map_err(|_| poisoned())?;
        let id = obligation.id;
        let stored = map.get(&id).ok_or(PlannerError::NotFound { id })?;
        if stored.version != expected_version {
            return Err(PlannerError::ConcurrentModification { id });
        }
        map.insert(id, obligation);
        Ok(())
    }
}

fn poisoned() -> PlannerError {
    PlannerError::Storage("obligation store mutex poisoned".into())
}
