//! In-memory `AccountRepository` adapter over `MemoryStore`.
//!
//! Aggregates are flattened into one record per entity on the way in and
//! rebuilt through the validating domain constructors on the way out. There
//! is no identity cache: every `get` rehydrates from the store, and the
//! transaction overlay makes uncommitted writes read back correctly.

use std::sync::Arc;

use subledger_accounts::{
    Account, AccountRepository, Card, CardNumber, RepositoryError, SubAccount, SubAccountKind,
    Transaction,
};
use subledger_core::{AccountId, Entity, SubAccountId, TransactionReference};

use crate::records::{
    AccountRecord, CardRecord, SubAccountRecord, SubAccountRecordKind, TransactionRecord,
};
use crate::store::{MemoryStore, StoreError};

fn storage(err: StoreError) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

/// Repository adapter backed by the shared in-memory store.
#[derive(Debug, Clone)]
pub struct InMemoryAccountRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryAccountRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn account_record(account: &Account) -> AccountRecord {
        AccountRecord {
            id: *account.id(),
            owner: account.owner(),
            kind: account.kind(),
        }
    }

    fn subaccount_record(subaccount: &SubAccount, account: AccountId) -> SubAccountRecord {
        SubAccountRecord {
            id: *subaccount.id(),
            account,
            kind: match subaccount.kind() {
                SubAccountKind::Regular => SubAccountRecordKind::Regular,
                SubAccountKind::Card(_) => SubAccountRecordKind::Card,
            },
        }
    }

    fn transaction_record(transaction: &Transaction, subaccount: SubAccountId) -> TransactionRecord {
        TransactionRecord {
            id: *transaction.id(),
            subaccount,
            reference: transaction.reference(),
            amount: transaction.amount(),
            kind: transaction.kind(),
            status: transaction.status(),
            created_at: transaction.created_at(),
        }
    }

    fn card_record(card: &Card, subaccount: SubAccountId) -> CardRecord {
        CardRecord {
            id: *card.id(),
            subaccount,
            number: card.number().clone(),
        }
    }

    /// Write the aggregate's sub-accounts, cards and transactions. `add`
    /// inserts (duplicate keys rejected); `update` upserts, so transactions
    /// appended since the last save land as new rows.
    fn write_parts(&self, account: &Account, upsert: bool) -> Result<(), StoreError> {
        for subaccount in account.subaccounts() {
            let record = Self::subaccount_record(subaccount, *account.id());
            if upsert {
                self.store.update_subaccount(record)?;
            } else {
                self.store.add_subaccount(record)?;
            }

            if let Some(card) = subaccount.card() {
                let record = Self::card_record(card, *subaccount.id());
                if upsert {
                    self.store.update_card(record)?;
                } else {
                    self.store.add_card(record)?;
                }
            }

            for transaction in subaccount.transactions() {
                let record = Self::transaction_record(transaction, *subaccount.id());
                if upsert {
                    self.store.update_transaction(record)?;
                } else {
                    self.store.add_transaction(record)?;
                }
            }
        }
        Ok(())
    }

    fn rebuild_subaccount(
        &self,
        record: SubAccountRecord,
    ) -> Result<SubAccount, RepositoryError> {
        let subaccount_id = record.id;

        let mut transaction_records = self
            .store
            .find_transactions(|t| t.subaccount == subaccount_id)
            .map_err(storage)?;
        // Restore temporal order; the store hands back an unordered snapshot.
        transaction_records.sort_by_key(|t| (t.created_at, *t.id.as_uuid()));

        let mut transactions = Vec::with_capacity(transaction_records.len());
        for t in transaction_records {
            transactions.push(Transaction::from_parts(
                t.id,
                t.reference,
                t.amount,
                t.kind,
                t.status,
                t.created_at,
            )?);
        }

        let kind = match record.kind {
            SubAccountRecordKind::Regular => SubAccountKind::Regular,
            SubAccountRecordKind::Card => {
                let mut cards = self
                    .store
                    .find_cards(|c| c.subaccount == subaccount_id)
                    .map_err(storage)?;
                if cards.len() != 1 {
                    return Err(RepositoryError::Corrupted(format!(
                        "card sub-account {subaccount_id} has {} associated card records",
                        cards.len()
                    )));
                }
                let card = cards.remove(0);
                SubAccountKind::Card(Card::from_parts(card.id, card.number))
            }
        };

        Ok(SubAccount::from_parts(subaccount_id, kind, transactions))
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn get(&self, id: AccountId) -> Result<Account, RepositoryError> {
        let record = self.store.get_account(id).map_err(|e| match e {
            StoreError::NotFound => RepositoryError::DoesNotExist(id),
            other => storage(other),
        })?;

        let mut subaccount_records = self
            .store
            .find_subaccounts(|s| s.account == id)
            .map_err(storage)?;
        subaccount_records.sort_by_key(|s| *s.id.as_uuid());

        let mut subaccounts = Vec::with_capacity(subaccount_records.len());
        for subaccount_record in subaccount_records {
            subaccounts.push(self.rebuild_subaccount(subaccount_record)?);
        }

        Ok(Account::from_parts(
            record.id,
            record.owner,
            record.kind,
            subaccounts,
        )?)
    }

    fn add(&self, account: &Account) -> Result<(), RepositoryError> {
        self.store
            .add_account(Self::account_record(account))
            .map_err(|e| match e {
                StoreError::AlreadyExists => RepositoryError::AlreadyExists(*account.id()),
                other => storage(other),
            })?;
        self.write_parts(account, false).map_err(storage)
    }

    fn update(&self, account: &Account) -> Result<(), RepositoryError> {
        self.store
            .update_account(Self::account_record(account))
            .map_err(storage)?;
        self.write_parts(account, true).map_err(storage)
    }

    fn find_by_card_number(&self, number: &CardNumber) -> Result<Account, RepositoryError> {
        let matches = self
            .store
            .find_cards(|c| c.number == *number)
            .map_err(storage)?;
        if matches.len() != 1 {
            return Err(RepositoryError::CardLookupFailed {
                number: number.clone(),
                found: matches.len(),
            });
        }

        let subaccount_id = matches[0].subaccount;
        let subaccount = self.store.get_subaccount(subaccount_id).map_err(|e| match e {
            StoreError::NotFound => RepositoryError::Corrupted(format!(
                "card record points at missing sub-account {subaccount_id}"
            )),
            other => storage(other),
        })?;

        self.get(subaccount.account)
    }

    fn find_by_transaction_reference(
        &self,
        reference: TransactionReference,
    ) -> Result<Vec<Account>, RepositoryError> {
        let legs = self
            .store
            .find_transactions(|t| t.reference == reference)
            .map_err(storage)?;

        // First-seen order; an account appears once however many legs it holds.
        let mut account_ids: Vec<AccountId> = Vec::new();
        for leg in legs {
            let subaccount = self.store.get_subaccount(leg.subaccount).map_err(|e| match e {
                StoreError::NotFound => RepositoryError::Corrupted(format!(
                    "transaction {} points at missing sub-account {}",
                    leg.id, leg.subaccount
                )),
                other => storage(other),
            })?;
            if !account_ids.contains(&subaccount.account) {
                account_ids.push(subaccount.account);
            }
        }

        account_ids.into_iter().map(|id| self.get(id)).collect()
    }
}
