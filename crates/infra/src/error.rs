//! Top-level error facade for unit-of-work scopes.

use thiserror::Error;

use subledger_accounts::{AccountError, RepositoryError, ServiceError};

use crate::store::StoreError;

/// Everything a unit-of-work scope body can fail with.
///
/// Wraps each layer transparently: the caller of a scope sees the original
/// error value, unwrapped and unreworded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
