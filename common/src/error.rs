use thiserror::Error;

use crate::lightning_gateway::GatewayError;

/// Everything a ledger operation can fail with. A failed operation leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("wallet already exists, log out first")]
    AlreadyExists,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    #[error("lightning is not enabled")]
    Disabled,

    #[error(transparent)]
    Provider(#[from] GatewayError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
