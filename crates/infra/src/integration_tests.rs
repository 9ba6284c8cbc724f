//! Integration tests for the full ledger pipeline.
//!
//! Tests: Service → Repository → UnitOfWork → MemoryStore
//!
//! Verifies:
//! - Multi-account operations commit or roll back atomically
//! - Reads inside a scope observe its own staged writes
//! - Aggregates survive the record round-trip unchanged

use std::sync::Arc;

use subledger_accounts::{
    Account, AccountError, AccountRepository, AccountTransferService, Card, CardNumber,
    CardPurchaseService, Money, RepositoryError, ServiceError, SubAccount,
    TransactionSettlementService,
};
use subledger_core::{AccountId, Entity, OwnerId, TransactionReference};

use crate::error::LedgerError;
use crate::repository::InMemoryAccountRepository;
use crate::store::MemoryStore;
use crate::unit_of_work::WorkManager;

fn aud(amount: i64) -> Money {
    Money::from(amount)
}

fn manager() -> WorkManager {
    // Idempotent; lets RUST_LOG surface store/service events while debugging.
    subledger_observability::init();
    WorkManager::new(Arc::new(MemoryStore::new()))
}

/// A repository reading the committed state, outside any unit of work.
fn committed_view(manager: &WorkManager) -> InMemoryAccountRepository {
    InMemoryAccountRepository::new(Arc::clone(manager.store()))
}

fn empty_regular_account() -> Account {
    Account::regular(OwnerId::new(), vec![SubAccount::regular()]).unwrap()
}

/// A regular account with a settled opening balance, committed to the store.
fn seed_funded_account(manager: &WorkManager, amount: i64) -> AccountId {
    let mut account = empty_regular_account();
    let opening = TransactionReference::new();
    account.credit(aud(amount), opening).unwrap();
    account.settle(opening).unwrap();
    let id = *account.id();

    manager
        .scope(|unit| -> Result<(), LedgerError> {
            unit.accounts().add(&account)?;
            Ok(())
        })
        .unwrap();
    id
}

fn seed_account(manager: &WorkManager, account: &Account) {
    manager
        .scope(|unit| -> Result<(), LedgerError> {
            unit.accounts().add(account)?;
            Ok(())
        })
        .unwrap();
}

#[test]
fn transfer_moves_total_between_wallet_and_account() {
    let manager = manager();
    let wallet = Account::external_counterparty(OwnerId::new());
    let account = empty_regular_account();
    let (wallet_id, account_id) = (*wallet.id(), *account.id());
    seed_account(&manager, &wallet);
    seed_account(&manager, &account);

    manager
        .scope(|unit| -> Result<(), LedgerError> {
            let repository = unit.accounts();
            AccountTransferService::transfer(
                repository.as_ref(),
                wallet_id,
                account_id,
                aud(10),
            )?;
            Ok(())
        })
        .unwrap();

    let view = committed_view(&manager);
    assert_eq!(view.get(account_id).unwrap().balance().total(), aud(10));
    assert_eq!(view.get(wallet_id).unwrap().balance().total(), aud(-10));
}

#[test]
fn transfer_without_cover_fails_and_rolls_back() {
    let manager = manager();
    let source_id = seed_funded_account(&manager, 20);
    let destination = empty_regular_account();
    let destination_id = *destination.id();
    seed_account(&manager, &destination);

    let result = manager.scope(|unit| -> Result<(), LedgerError> {
        let repository = unit.accounts();
        AccountTransferService::transfer(repository.as_ref(), source_id, destination_id, aud(25))?;
        Ok(())
    });

    assert!(matches!(
        result,
        Err(LedgerError::Service(ServiceError::Account(
            AccountError::InsufficientBalance { .. }
        )))
    ));

    let view = committed_view(&manager);
    assert_eq!(view.get(source_id).unwrap().balance().available(), aud(20));
    assert_eq!(view.get(destination_id).unwrap().balance().total(), aud(0));
}

#[test]
fn error_after_a_successful_transfer_discards_its_staged_writes() {
    let manager = manager();
    let source_id = seed_funded_account(&manager, 20);
    let destination = empty_regular_account();
    let destination_id = *destination.id();
    seed_account(&manager, &destination);

    let result = manager.scope(|unit| -> Result<(), LedgerError> {
        let repository = unit.accounts();
        AccountTransferService::transfer(repository.as_ref(), source_id, destination_id, aud(5))?;
        // Something later in the scope fails; the transfer must not survive.
        Err(LedgerError::Account(AccountError::validation(
            "induced failure",
        )))
    });
    assert!(result.is_err());

    let view = committed_view(&manager);
    assert_eq!(view.get(source_id).unwrap().balance().available(), aud(20));
    assert_eq!(view.get(source_id).unwrap().balance().pending(), aud(0));
    assert_eq!(view.get(destination_id).unwrap().balance().total(), aud(0));
}

#[test]
fn transfer_to_the_same_account_is_rejected() {
    let manager = manager();
    let id = seed_funded_account(&manager, 20);

    let result = manager.scope(|unit| -> Result<(), LedgerError> {
        AccountTransferService::transfer(unit.accounts().as_ref(), id, id, aud(5))?;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(LedgerError::Service(ServiceError::SameAccount))
    ));
}

#[test]
fn reads_inside_a_scope_observe_staged_writes() {
    let manager = manager();
    let source_id = seed_funded_account(&manager, 20);
    let destination = empty_regular_account();
    let destination_id = *destination.id();
    seed_account(&manager, &destination);

    manager
        .scope(|unit| -> Result<(), LedgerError> {
            let repository = unit.accounts();
            AccountTransferService::transfer(
                repository.as_ref(),
                source_id,
                destination_id,
                aud(5),
            )?;

            // Same scope, same transaction: the debit is already visible.
            let source = repository.get(source_id)?;
            assert_eq!(source.balance().total(), aud(15));
            Ok(())
        })
        .unwrap();
}

#[test]
fn purchase_with_unknown_card_fails_with_lookup_error_and_writes_nothing() {
    let manager = manager();
    let merchant = Account::external_counterparty(OwnerId::new());
    let merchant_id = *merchant.id();
    seed_account(&manager, &merchant);

    let result = manager.scope(|unit| -> Result<(), LedgerError> {
        let number = CardNumber::new("4999888877776666")?;
        CardPurchaseService::make_purchase(
            unit.accounts().as_ref(),
            &number,
            merchant_id,
            aud(5),
            TransactionReference::new(),
        )?;
        Ok(())
    });

    assert!(matches!(
        result,
        Err(LedgerError::Service(ServiceError::Repository(
            RepositoryError::CardLookupFailed { found: 0, .. }
        )))
    ));

    let view = committed_view(&manager);
    let merchant = view.get(merchant_id).unwrap();
    assert!(merchant.subaccounts().iter().all(|s| s.transactions().is_empty()));
}

#[test]
fn card_purchase_debits_the_cardholder_and_credits_the_merchant() {
    let manager = manager();

    let number = CardNumber::new("4111111111111111").unwrap();
    let mut cardholder =
        Account::regular_with_cards(OwnerId::new(), vec![Card::new(number.clone())]).unwrap();
    let opening = TransactionReference::new();
    cardholder.credit(aud(30), opening).unwrap();
    cardholder.settle(opening).unwrap();
    let cardholder_id = *cardholder.id();
    seed_account(&manager, &cardholder);

    let merchant = Account::external_counterparty(OwnerId::new());
    let merchant_id = *merchant.id();
    seed_account(&manager, &merchant);

    let reference = TransactionReference::new();
    manager
        .scope(|unit| -> Result<(), LedgerError> {
            CardPurchaseService::make_purchase(
                unit.accounts().as_ref(),
                &number,
                merchant_id,
                aud(12),
                reference,
            )?;
            Ok(())
        })
        .unwrap();

    let view = committed_view(&manager);
    assert_eq!(view.get(cardholder_id).unwrap().balance().total(), aud(18));
    assert_eq!(view.get(merchant_id).unwrap().balance().total(), aud(12));

    // The debit landed on the card sub-account, not the regular one.
    let cardholder = view.get(cardholder_id).unwrap();
    let card_sub = cardholder
        .subaccounts()
        .iter()
        .find(|s| !s.is_regular())
        .unwrap();
    assert_eq!(card_sub.transactions().len(), 1);
}

#[test]
fn settlement_finalises_both_legs_of_a_transfer() {
    let manager = manager();
    let wallet = Account::external_counterparty(OwnerId::new());
    let wallet_id = *wallet.id();
    seed_account(&manager, &wallet);
    let account = empty_regular_account();
    let account_id = *account.id();
    seed_account(&manager, &account);

    let reference = manager
        .scope(|unit| -> Result<TransactionReference, LedgerError> {
            Ok(AccountTransferService::transfer(
                unit.accounts().as_ref(),
                wallet_id,
                account_id,
                aud(10),
            )?)
        })
        .unwrap();

    manager
        .scope(|unit| -> Result<(), LedgerError> {
            TransactionSettlementService::settle_transaction(unit.accounts().as_ref(), reference)?;
            Ok(())
        })
        .unwrap();

    let view = committed_view(&manager);
    let account_balance = view.get(account_id).unwrap().balance();
    assert_eq!(account_balance.available(), aud(10));
    assert_eq!(account_balance.pending(), aud(0));

    let wallet_balance = view.get(wallet_id).unwrap().balance();
    assert_eq!(wallet_balance.available(), aud(-10));
    assert_eq!(wallet_balance.pending(), aud(0));
}

#[test]
fn add_then_get_reconstructs_the_aggregate() {
    let manager = manager();

    let number = CardNumber::new("5105105105105100").unwrap();
    let mut account =
        Account::regular_with_cards(OwnerId::new(), vec![Card::new(number.clone())]).unwrap();
    let opening = TransactionReference::new();
    account.credit(aud(30), opening).unwrap();
    account.settle(opening).unwrap();
    account
        .debit_card(&number, aud(12), TransactionReference::new())
        .unwrap();
    seed_account(&manager, &account);

    let reloaded = committed_view(&manager).get(*account.id()).unwrap();

    assert_eq!(reloaded.id(), account.id());
    assert_eq!(reloaded.kind(), account.kind());
    assert_eq!(reloaded.owner(), account.owner());
    assert_eq!(reloaded.balance(), account.balance());

    let legs = |a: &Account| {
        let mut legs: Vec<_> = a
            .subaccounts()
            .iter()
            .flat_map(|s| s.transactions())
            .map(|t| (t.reference(), t.amount(), t.kind(), t.status()))
            .collect();
        legs.sort_by_key(|(r, _, _, _)| *r.as_uuid());
        legs
    };
    assert_eq!(legs(&reloaded), legs(&account));
}

#[test]
fn get_for_an_unknown_account_fails_with_does_not_exist() {
    let manager = manager();
    let missing = AccountId::new();
    let err = committed_view(&manager).get(missing).unwrap_err();
    assert_eq!(err, RepositoryError::DoesNotExist(missing));
}

#[test]
fn repository_auto_commits_while_the_store_is_idle() {
    let manager = manager();
    let repository = committed_view(&manager);

    let account = empty_regular_account();
    repository.add(&account).unwrap();
    assert!(repository.get(*account.id()).is_ok());

    // Duplicate identity is rejected.
    assert_eq!(
        repository.add(&account).unwrap_err(),
        RepositoryError::AlreadyExists(*account.id())
    );
}

#[test]
fn settlement_touches_every_account_sharing_the_reference() {
    let manager = manager();
    let source_id = seed_funded_account(&manager, 20);
    let destination = empty_regular_account();
    let destination_id = *destination.id();
    seed_account(&manager, &destination);

    let reference = manager
        .scope(|unit| -> Result<TransactionReference, LedgerError> {
            Ok(AccountTransferService::transfer(
                unit.accounts().as_ref(),
                source_id,
                destination_id,
                aud(7),
            )?)
        })
        .unwrap();

    // Both accounts hold one leg each under the shared reference.
    let touched = committed_view(&manager)
        .find_by_transaction_reference(reference)
        .unwrap();
    assert_eq!(touched.len(), 2);
}
