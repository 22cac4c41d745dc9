use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::warn;

use crate::errors::Result;
use crate::obligation::Obligation;

/// Outcome of loading a snapshot: the obligations plus an integrity warning
/// for each one whose data would not pass creation-time validation.
///
/// Flagged obligations are kept rather than dropped, so a caller can surface
/// them for correction; sweeps and forecasts already exclude rules that fail
/// validation, and terminal state is never due.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    pub obligations: Vec<Obligation>,
    pub warnings: Vec<String>,
}

/// Writes the obligation set to disk atomically by staging to a temporary
/// file, creating the parent directory if needed.
pub fn save_obligations(obligations: &[Obligation], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let staged = path.with_extension("tmp");
    fs::write(&staged, serde_json::to_string_pretty(obligations)?)?;
    fs::rename(staged, path)?;
    Ok(())
}

/// Loads an obligation snapshot from disk. Malformed JSON or an unknown
/// frequency fails the load outright; integrity problems in individual
/// obligations (inverted bounds, negative amounts) are reported as warnings
/// instead, since one bad record must not make the rest unreachable.
pub fn load_obligations(path: &Path) -> Result<SnapshotReport> {
    let data = fs::read_to_string(path)?;
    let obligations: Vec<Obligation> = serde_json::from_str(&data)?;

    let mut report = SnapshotReport {
        obligations,
        warnings: Vec::new(),
    };
    for obligation in &report.obligations {
        if let Err(err) = obligation.rule.validate() {
            report
                .warnings
                .push(format!("obligation {}: {err}", obligation.id));
        }
        if obligation.amount < Decimal::ZERO {
            report.warnings.push(format!(
                "obligation {}: negative amount {}",
                obligation.id, obligation.amount
            ));
        }
    }
    for warning in &report.warnings {
        warn!(%warning, "snapshot integrity warning");
    }
    Ok(report)
}
