//! In-memory transactional store: strongly-typed tables with a two-phase
//! commit overlay.
//!
//! The store is either **idle** (writes apply directly to the base tables,
//! auto-commit) or **in-transaction** (writes buffer into an overlay; reads
//! check the overlay first, falling back to the base tables). `commit` merges
//! the overlay into the base tables, `rollback` discards it. At most one
//! transaction is in flight at a time.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use subledger_core::{AccountId, CardId, SubAccountId, TransactionId};

use crate::records::{AccountRecord, CardRecord, SubAccountRecord, TransactionRecord};

/// Failures raised by the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record under this key.
    #[error("no matching record")]
    NotFound,

    /// `add` over a key that is already present (in the base table or the
    /// overlay).
    #[error("cannot insert over an existing key")]
    AlreadyExists,

    /// `begin` while a transaction is already active.
    #[error("a store transaction is already active")]
    TransactionActive,

    /// `commit`/`rollback` while idle.
    #[error("no active store transaction")]
    NoActiveTransaction,

    /// A panic poisoned the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// One table: committed base rows plus the uncommitted overlay.
#[derive(Debug)]
struct Table<K, R> {
    base: HashMap<K, R>,
    overlay: HashMap<K, R>,
}

impl<K, R> Default for Table<K, R> {
    fn default() -> Self {
        Self {
            base: HashMap::new(),
            overlay: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy, R: Clone> Table<K, R> {
    fn get(&self, key: &K) -> Option<R> {
        self.overlay
            .get(key)
            .or_else(|| self.base.get(key))
            .cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.overlay.contains_key(key) || self.base.contains_key(key)
    }

    fn write(&mut self, key: K, record: R, buffered: bool) {
        if buffered {
            self.overlay.insert(key, record);
        } else {
            self.base.insert(key, record);
        }
    }

    /// Snapshot of all matching records, overlay entries shadowing base
    /// entries under the same key.
    fn find(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.base
            .iter()
            .filter(|(key, _)| !self.overlay.contains_key(*key))
            .map(|(_, record)| record)
            .chain(self.overlay.values())
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    fn staged(&self) -> usize {
        self.overlay.len()
    }

    fn commit(&mut self) {
        let overlay = std::mem::take(&mut self.overlay);
        self.base.extend(overlay);
    }

    fn rollback(&mut self) {
        self.overlay.clear();
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    in_transaction: bool,
    accounts: Table<AccountId, AccountRecord>,
    subaccounts: Table<SubAccountId, SubAccountRecord>,
    transactions: Table<TransactionId, TransactionRecord>,
    cards: Table<CardId, CardRecord>,
}

impl StoreInner {
    fn staged(&self) -> usize {
        self.accounts.staged()
            + self.subaccounts.staged()
            + self.transactions.staged()
            + self.cards.staged()
    }
}

/// The in-memory store. Interior locking so it can be shared behind `Arc`;
/// the transaction slot is part of the locked state, so begin/commit/rollback
/// and the overlay stay consistent under concurrent use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

macro_rules! store_table {
    ($field:ident, $key:ty, $record:ty, $get:ident, $add:ident, $update:ident, $find:ident) => {
        impl MemoryStore {
            pub fn $get(&self, key: $key) -> Result<$record, StoreError> {
                self.read()?.$field.get(&key).ok_or(StoreError::NotFound)
            }

            pub fn $add(&self, record: $record) -> Result<(), StoreError> {
                let mut inner = self.write()?;
                if inner.$field.contains(&record.id) {
                    return Err(StoreError::AlreadyExists);
                }
                let buffered = inner.in_transaction;
                inner.$field.write(record.id, record, buffered);
                Ok(())
            }

            pub fn $update(&self, record: $record) -> Result<(), StoreError> {
                let mut inner = self.write()?;
                let buffered = inner.in_transaction;
                inner.$field.write(record.id, record, buffered);
                Ok(())
            }

            pub fn $find(
                &self,
                predicate: impl Fn(&$record) -> bool,
            ) -> Result<Vec<$record>, StoreError> {
                Ok(self.read()?.$field.find(predicate))
            }
        }
    };
}

store_table!(
    accounts,
    AccountId,
    AccountRecord,
    get_account,
    add_account,
    update_account,
    find_accounts
);
store_table!(
    subaccounts,
    SubAccountId,
    SubAccountRecord,
    get_subaccount,
    add_subaccount,
    update_subaccount,
    find_subaccounts
);
store_table!(
    transactions,
    TransactionId,
    TransactionRecord,
    get_transaction,
    add_transaction,
    update_transaction,
    find_transactions
);
store_table!(
    cards,
    CardId,
    CardRecord,
    get_card,
    add_card,
    update_card,
    find_cards
);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Open the transaction overlay. Idle -> in-transaction.
    pub fn begin(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.in_transaction {
            return Err(StoreError::TransactionActive);
        }
        inner.in_transaction = true;
        debug!("store transaction begun");
        Ok(())
    }

    /// Merge the overlay into the base tables. In-transaction -> idle.
    pub fn commit(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        let staged = inner.staged();
        inner.accounts.commit();
        inner.subaccounts.commit();
        inner.transactions.commit();
        inner.cards.commit();
        inner.in_transaction = false;
        info!(staged, "store transaction committed");
        Ok(())
    }

    /// Discard the overlay without merging. In-transaction -> idle.
    pub fn rollback(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        let discarded = inner.staged();
        inner.accounts.rollback();
        inner.subaccounts.rollback();
        inner.transactions.rollback();
        inner.cards.rollback();
        inner.in_transaction = false;
        warn!(discarded, "store transaction rolled back");
        Ok(())
    }

    pub fn in_transaction(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.in_transaction)
    }
}
