use thiserror::Error;
use uuid::Uuid;

/// Error type covering rule validation, materialization, and storage glue.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The rule data is malformed (unknown frequency, inverted bounds, bad
    /// anchor). Never coerced to a default; the obligation is excluded from
    /// sweeps and forecasts until corrected.
    #[error("rule integrity error: {0}")]
    RuleIntegrity(String),
    #[error("target resource unavailable: {0}")]
    ResourceUnavailable(String),
    /// The obligation's version moved between read and write; the losing
    /// attempt is discarded, not retried within the same call.
    #[error("obligation {id} was modified concurrently")]
    ConcurrentModification { id: Uuid },
    #[error("obligation {id} is not due")]
    NotDue { id: Uuid },
    #[error("obligation {id} not found")]
    NotFound { id: Uuid },
    #[error("obligation {id} does not use manual confirmation")]
    NotManual { id: Uuid },
    #[error("invalid window: {0}")]
    InvalidWindow(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl From<std::io::Error> for PlannerError {
    fn from(err: std::io::Error) -> Self {
        PlannerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Storage(err.to_string())
    }
}
