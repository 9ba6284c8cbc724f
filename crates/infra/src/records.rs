//! Storage records: the flat rows the repository maps aggregates to and from.
//!
//! One record type per table; foreign keys are the typed identifiers. Records
//! are plain `Clone` data, so reads and writes hand out copies and stored
//! state is never aliased with caller-held aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use subledger_accounts::{AccountKind, CardNumber, Money, TransactionKind, TransactionStatus};
use subledger_core::{
    AccountId, CardId, OwnerId, SubAccountId, TransactionId, TransactionReference,
};

/// One row per account aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub owner: OwnerId,
    pub kind: AccountKind,
}

/// Sub-account kind tag as stored; the card payload lives in its own table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubAccountRecordKind {
    Regular,
    Card,
}

/// One row per sub-account, keyed back to its owning account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccountRecord {
    pub id: SubAccountId,
    pub account: AccountId,
    pub kind: SubAccountRecordKind,
}

/// One row per transaction, keyed back to its sub-account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub subaccount: SubAccountId,
    pub reference: TransactionReference,
    pub amount: Money,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// One row per card, keyed back to the card sub-account holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub subaccount: SubAccountId,
    pub number: CardNumber,
}
