//! The `AccountRepository` port.
//!
//! Aggregate logic and the domain services must not assume a particular
//! storage technology; adapters (e.g. the in-memory one in `subledger-infra`)
//! plug in behind this trait.

use thiserror::Error;

use subledger_core::{AccountId, TransactionReference};

use crate::account::Account;
use crate::card::CardNumber;
use crate::error::AccountError;

/// Failures raised by repository implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No account with this identity.
    #[error("account {0} does not exist")]
    DoesNotExist(AccountId),

    /// `add` over an identity that is already stored.
    #[error("account {0} already exists")]
    AlreadyExists(AccountId),

    /// A card-number lookup matched zero or more than one card record.
    /// Treated as a data-integrity failure, not a recoverable miss.
    #[error("expected exactly one card record for number {number}, found {found}")]
    CardLookupFailed { number: CardNumber, found: usize },

    /// Stored records do not rebuild into a valid aggregate.
    #[error("stored records are inconsistent: {0}")]
    Corrupted(String),

    /// Rehydration re-runs the domain constructors; their failures surface
    /// unchanged.
    #[error(transparent)]
    Domain(#[from] AccountError),

    /// A failure of the underlying storage mechanism.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Load/save port for the account aggregate.
pub trait AccountRepository {
    /// Load an aggregate by identity.
    fn get(&self, id: AccountId) -> Result<Account, RepositoryError>;

    /// Persist a new aggregate.
    fn add(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Persist modifications to a previously loaded aggregate.
    fn update(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Load the account owning the card with this number. Exactly one card
    /// record must match.
    fn find_by_card_number(&self, number: &CardNumber) -> Result<Account, RepositoryError>;

    /// Every account containing at least one transaction with this reference
    /// (used for multi-account settlement).
    fn find_by_transaction_reference(
        &self,
        reference: TransactionReference,
    ) -> Result<Vec<Account>, RepositoryError>;
}
