//! Account domain errors.

use thiserror::Error;

use subledger_core::TransactionId;

use crate::card::CardNumber;
use crate::money::Money;

/// Result type used across the accounts domain.
pub type AccountResult<T> = Result<T, AccountError>;

/// Deterministic domain failures raised by the account aggregate and its parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Construction-time validation failure (wrong sub-account composition,
    /// negative amount, malformed card number, ...). Fails fast,
    /// non-recoverable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A debit would push a no-overdraw account into arrears. Recoverable:
    /// callers let it propagate so the enclosing unit of work rolls back.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Money, available: Money },

    /// No card sub-account matches the given number.
    #[error("no card sub-account matches number {number}")]
    NoMatchingCard { number: CardNumber },

    /// Settlement was attempted on a transaction that is not pending.
    /// Indicates a logic/ordering bug upstream.
    #[error("transaction {id} is not pending")]
    NotPending { id: TransactionId },
}

impl AccountError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
