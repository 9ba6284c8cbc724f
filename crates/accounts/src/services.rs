//! Domain services: multi-account operations against a repository.
//!
//! Services mutate aggregates in memory and stage the results through
//! `AccountRepository::update`. They never swallow domain or repository
//! errors; the enclosing unit-of-work scope is the sole place where an error
//! turns into a rollback.

use thiserror::Error;
use tracing::debug;

use subledger_core::{AccountId, TransactionReference};

use crate::card::CardNumber;
use crate::error::AccountError;
use crate::money::Money;
use crate::repository::{AccountRepository, RepositoryError};

/// Failures raised by the domain services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A transfer where source and destination are the same account.
    #[error("cannot transfer to the same account")]
    SameAccount,

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Atomic two-legged transfer between accounts.
pub struct AccountTransferService;

impl AccountTransferService {
    /// Debit `source` and credit `destination` by `amount` under one freshly
    /// generated reference, which is returned so the transfer can be settled
    /// later.
    ///
    /// `InsufficientBalance` propagates untouched; run inside a unit-of-work
    /// scope, a failed transfer leaves the store exactly as it was.
    pub fn transfer(
        repository: &dyn AccountRepository,
        source: AccountId,
        destination: AccountId,
        amount: Money,
    ) -> Result<TransactionReference, ServiceError> {
        if source == destination {
            return Err(ServiceError::SameAccount);
        }

        let mut source_account = repository.get(source)?;
        let mut destination_account = repository.get(destination)?;

        let reference = TransactionReference::new();
        source_account.debit(amount, reference)?;
        destination_account.credit(amount, reference)?;

        repository.update(&source_account)?;
        repository.update(&destination_account)?;

        debug!(%source, %destination, %amount, %reference, "transfer staged");
        Ok(reference)
    }
}

/// A card purchase: debit the cardholder, credit the merchant.
pub struct CardPurchaseService;

impl CardPurchaseService {
    /// Debit the card sub-account owning `card_number` and credit `merchant`,
    /// both under the caller-supplied `reference`.
    pub fn make_purchase(
        repository: &dyn AccountRepository,
        card_number: &CardNumber,
        merchant: AccountId,
        amount: Money,
        reference: TransactionReference,
    ) -> Result<(), ServiceError> {
        let mut cardholder = repository.find_by_card_number(card_number)?;
        let mut merchant_account = repository.get(merchant)?;

        cardholder.debit_card(card_number, amount, reference)?;
        merchant_account.credit(amount, reference)?;

        repository.update(&cardholder)?;
        repository.update(&merchant_account)?;

        debug!(card = %card_number, %merchant, %amount, %reference, "purchase staged");
        Ok(())
    }
}

/// Finalizes previously pending operations.
pub struct TransactionSettlementService;

impl TransactionSettlementService {
    /// Settle every account holding a transaction leg with this reference.
    /// Independent of when the legs were created.
    pub fn settle_transaction(
        repository: &dyn AccountRepository,
        reference: TransactionReference,
    ) -> Result<(), ServiceError> {
        let accounts = repository.find_by_transaction_reference(reference)?;
        let touched = accounts.len();

        for mut account in accounts {
            account.settle(reference)?;
            repository.update(&account)?;
        }

        debug!(%reference, touched, "settlement staged");
        Ok(())
    }
}
