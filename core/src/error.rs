use crate::types::{Amount, PrizeId, SpinNumber};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Prize {id} not found")]
    PrizeNotFound { id: PrizeId },

    #[error("Budget exceeded: required {required}, available {available}")]
    BudgetExceeded { required: Amount, available: Amount },

    #[error("Invalid schedule entry for spin {spin_number}: {reason}")]
    InvalidScheduleEntry {
        spin_number: SpinNumber,
        reason: String,
    },

    #[error("Schedule operations require the schedule fairness gate")]
    ScheduleUnavailable,

    #[error("Cooldown operations require the cooldown fairness gate")]
    CooldownUnavailable,

    #[error("A spin is already in flight")]
    SpinInFlight,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
