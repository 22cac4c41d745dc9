use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PlannerError, Result};
use crate::obligation::Classification;

/// A materialized occurrence as posted to the ledger. Its natural key is
/// `(obligation_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub obligation_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub classification: Classification,
    pub target_ref: Option<Uuid>,
}

/// Receiving end for materialized entries, plus the resource-validity lookup
/// the engine performs before posting.
pub trait LedgerSink: Send + Sync {
    /// Checks that the referenced resource can currently receive entries,
    /// failing with `ResourceUnavailable` otherwise. An unassigned (`None`)
    /// reference resolves: such obligations post without a target.
    fn resolve_resource(&self, target: Option<Uuid>) -> Result<()>;

    /// Appends an entry, idempotent on `(obligation_id, date)`: posting the
    /// same occurrence twice returns the id of the first write.
    fn append(&self, entry: LedgerEntry) -> Result<Uuid>;
}

/// In-memory sink with a deny-list of invalid resources, used for embedding
/// and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<HashMap<(Uuid, NaiveDate), LedgerEntry>>,
    invalid_resources: Mutex<HashSet<Uuid>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a resource invalid; later materializations against it fail.
    pub fn invalidate_resource(&self, id: Uuid) {
        if let Ok(mut set) = self.invalid_resources.lock() {
            set.insert(id);
        }
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut all: Vec<LedgerEntry> = self
            .entries
            .lock()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|entry| (entry.date, entry.obligation_id));
        all
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }
}

impl LedgerSink for MemorySink {
    fn resolve_resource(&self, target: Option<Uuid>) -> Result<()> {
        let Some(id) = target else {
            return Ok(());
        };
        let invalid = self
            .invalid_resources
            .lock()
            .map_err(|_| PlannerError::Storage("ledger sink mutex poisoned".into()))?;
        if invalid.contains(&id) {
            return Err(PlannerError::ResourceUnavailable(format!(
                "resource {id} is not valid"
            )));
        }
        Ok(())
    }

    fn append(&self, entry: LedgerEntry) -> Result<Uuid> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PlannerError::Storage("ledger sink mutex poisoned".into()))?;
        let key = (entry.obligation_id, entry.date);
        if let Some(existing) = entries.get(&key) {
            return Ok(existing.id);
        }
        let id = entry.id;
        entries.insert(key, entry);
        Ok(id)
    }
}
