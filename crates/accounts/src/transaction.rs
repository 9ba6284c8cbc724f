//! Transactions: immutable-after-settlement money-movement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use subledger_core::{Entity, TransactionId, TransactionReference};

use crate::error::{AccountError, AccountResult};
use crate::money::{Balance, Money};

/// Whether a transaction moves money into or out of its sub-account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// Lifecycle of a transaction. The only legal transition is
/// `Pending -> Settled`, driven by `Transaction::settle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Settled,
}

/// A single debit or credit against a sub-account.
///
/// Created by an account operation (`debit`/`debit_card`/`credit`), settled
/// later by reference, never deleted, never mutated except the status field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    reference: TransactionReference,
    amount: Money,
    kind: TransactionKind,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a fresh pending transaction. The amount must be non-negative;
    /// direction is carried by `kind`, not by the sign.
    pub fn new(
        reference: TransactionReference,
        amount: Money,
        kind: TransactionKind,
    ) -> AccountResult<Self> {
        Self::from_parts(
            TransactionId::new(),
            reference,
            amount,
            kind,
            TransactionStatus::Pending,
            Utc::now(),
        )
    }

    /// Rebuild a transaction from stored parts (repository rehydration).
    pub fn from_parts(
        id: TransactionId,
        reference: TransactionReference,
        amount: Money,
        kind: TransactionKind,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
    ) -> AccountResult<Self> {
        if amount.is_negative() {
            return Err(AccountError::validation(format!(
                "transaction amount must not be negative, got {amount}"
            )));
        }

        Ok(Self {
            id,
            reference,
            amount,
            kind,
            status,
            created_at,
        })
    }

    pub fn reference(&self) -> TransactionReference {
        self.reference
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// Transition `Pending -> Settled`.
    ///
    /// Settling a transaction that is not pending is an error (`NotPending`);
    /// the reverse transition does not exist.
    pub fn settle(&mut self) -> AccountResult<()> {
        if self.status != TransactionStatus::Pending {
            return Err(AccountError::NotPending { id: self.id });
        }
        self.status = TransactionStatus::Settled;
        Ok(())
    }

    /// Fold step for balance computation.
    ///
    /// A credit contributes positively and a debit negatively. While pending,
    /// the contribution is held against the balance (`pending` moves opposite
    /// to the signed amount); once settled it lands in `available`. Either
    /// way, `total = available - pending` moves by the same signed amount.
    pub fn adjust(&self, balance: Balance) -> Balance {
        let signed = match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        };

        match self.status {
            TransactionStatus::Pending => {
                Balance::new(balance.available(), balance.pending() - signed)
            }
            TransactionStatus::Settled => {
                Balance::new(balance.available() + signed, balance.pending())
            }
        }
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &TransactionId {
        &self.id
    }
}
