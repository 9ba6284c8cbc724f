//! The account aggregate root.

use serde::{Deserialize, Serialize};

use subledger_core::{AccountId, AggregateRoot, Entity, OwnerId, TransactionReference};

use crate::card::{Card, CardNumber};
use crate::error::{AccountError, AccountResult};
use crate::money::{Balance, Money};
use crate::subaccount::SubAccount;
use crate::transaction::{Transaction, TransactionKind};

/// Closed set of account kinds. The kind fixes the overdraw policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A typical customer account: one regular sub-account plus any number of
    /// card sub-accounts. May not go into arrears.
    Regular,
    /// A principal outside the system (a cash-in/cash-out sink, a merchant).
    /// Exactly one regular sub-account, and it may overdraw freely since the
    /// real funds live elsewhere.
    ExternalCounterparty,
}

impl AccountKind {
    /// Whether a debit may push the available balance negative.
    pub fn can_overdraw(self) -> bool {
        matches!(self, AccountKind::ExternalCounterparty)
    }
}

/// Structural invariant, dispatched on the account kind.
///
/// Regular accounts need exactly one regular sub-account among any number of
/// card sub-accounts. External counterparties need exactly one sub-account
/// total, and it must be regular.
fn check_subaccounts(kind: AccountKind, subaccounts: &[SubAccount]) -> AccountResult<()> {
    match kind {
        AccountKind::Regular => match subaccounts.iter().filter(|s| s.is_regular()).count() {
            1 => Ok(()),
            0 => Err(AccountError::validation(
                "sub-accounts must include a regular sub-account",
            )),
            _ => Err(AccountError::validation(
                "cannot have more than one regular sub-account for this account",
            )),
        },
        AccountKind::ExternalCounterparty => {
            if subaccounts.len() == 1 && subaccounts[0].is_regular() {
                Ok(())
            } else {
                Err(AccountError::validation(
                    "an external counterparty must have exactly one regular sub-account",
                ))
            }
        }
    }
}

/// Aggregate root: an annotated collection of sub-accounts, each a collection
/// of transactions. All mutation goes through the aggregate, which enforces
/// the structural invariant and the overdraw policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    owner: OwnerId,
    kind: AccountKind,
    subaccounts: Vec<SubAccount>,
}

impl Account {
    /// A regular account over an explicit sub-account list.
    pub fn regular(owner: OwnerId, subaccounts: Vec<SubAccount>) -> AccountResult<Self> {
        Self::from_parts(AccountId::new(), owner, AccountKind::Regular, subaccounts)
    }

    /// Convenience: a regular account with one fresh regular sub-account plus
    /// one card sub-account per supplied card.
    ///
    /// (An explicit sub-account list and a card list cannot be combined; use
    /// `regular` with the full list instead.)
    pub fn regular_with_cards(owner: OwnerId, cards: Vec<Card>) -> AccountResult<Self> {
        let mut subaccounts = vec![SubAccount::regular()];
        subaccounts.extend(cards.into_iter().map(SubAccount::for_card));
        Self::from_parts(AccountId::new(), owner, AccountKind::Regular, subaccounts)
    }

    /// An external counterparty with its single regular sub-account.
    pub fn external_counterparty(owner: OwnerId) -> Self {
        Self {
            id: AccountId::new(),
            owner,
            kind: AccountKind::ExternalCounterparty,
            subaccounts: vec![SubAccount::regular()],
        }
    }

    /// Rebuild an account from stored parts (repository rehydration).
    /// Re-validates the structural invariant.
    pub fn from_parts(
        id: AccountId,
        owner: OwnerId,
        kind: AccountKind,
        subaccounts: Vec<SubAccount>,
    ) -> AccountResult<Self> {
        if subaccounts.is_empty() {
            return Err(AccountError::validation(
                "cannot create an account without any sub-accounts",
            ));
        }
        check_subaccounts(kind, &subaccounts)?;

        Ok(Self {
            id,
            owner,
            kind,
            subaccounts,
        })
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn subaccounts(&self) -> &[SubAccount] {
        &self.subaccounts
    }

    /// The account balance: the pairwise sum of the sub-account balances.
    pub fn balance(&self) -> Balance {
        self.subaccounts.iter().map(SubAccount::balance).sum()
    }

    /// The unique regular sub-account, target of plain debits and credits.
    ///
    /// `None` only if the structural invariant is broken, which cannot occur
    /// post-construction.
    pub fn default_subaccount(&self) -> Option<&SubAccount> {
        self.subaccounts.iter().find(|s| s.is_regular())
    }

    fn default_subaccount_index(&self) -> AccountResult<usize> {
        self.subaccounts
            .iter()
            .position(SubAccount::is_regular)
            .ok_or_else(|| AccountError::validation("account has no regular sub-account"))
    }

    /// Overdraw guard: compares against the *available* portion only, never
    /// against pending holds.
    fn ensure_covered(&self, requested: Money) -> AccountResult<()> {
        if self.kind.can_overdraw() {
            return Ok(());
        }

        let available = self.balance().available();
        if requested > available {
            return Err(AccountError::InsufficientBalance {
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Debit the default sub-account: appends a pending debit transaction.
    /// Fails with `InsufficientBalance` when the account may not overdraw and
    /// the amount exceeds the available balance; the transaction list is then
    /// left untouched.
    pub fn debit(&mut self, amount: Money, reference: TransactionReference) -> AccountResult<()> {
        self.ensure_covered(amount)?;
        let index = self.default_subaccount_index()?;
        let transaction = Transaction::new(reference, amount, TransactionKind::Debit)?;
        self.subaccounts[index].record(transaction);
        Ok(())
    }

    /// Debit the card sub-account whose card number matches.
    ///
    /// Fails with `NoMatchingCard` when no card sub-account carries the
    /// number. The balance check is against the whole-account balance, same
    /// as `debit`.
    pub fn debit_card(
        &mut self,
        card_number: &CardNumber,
        amount: Money,
        reference: TransactionReference,
    ) -> AccountResult<()> {
        let Some(index) = self
            .subaccounts
            .iter()
            .position(|s| s.card().is_some_and(|c| c.number() == card_number))
        else {
            return Err(AccountError::NoMatchingCard {
                number: card_number.clone(),
            });
        };

        self.ensure_covered(amount)?;
        let transaction = Transaction::new(reference, amount, TransactionKind::Debit)?;
        self.subaccounts[index].record(transaction);
        Ok(())
    }

    /// Credit the default sub-account: appends a pending credit transaction.
    /// Credits are never checked against the balance.
    pub fn credit(&mut self, amount: Money, reference: TransactionReference) -> AccountResult<()> {
        let index = self.default_subaccount_index()?;
        let transaction = Transaction::new(reference, amount, TransactionKind::Credit)?;
        self.subaccounts[index].record(transaction);
        Ok(())
    }

    /// Settle every transaction with this reference, across all sub-accounts.
    /// Settlement can touch more than one sub-account when, say, a card debit
    /// and a regular credit share a reference. No match anywhere is a silent
    /// no-op; a matching non-pending transaction is an error.
    pub fn settle(&mut self, reference: TransactionReference) -> AccountResult<()> {
        for subaccount in &mut self.subaccounts {
            subaccount.settle(reference)?;
        }
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &AccountId {
        &self.id
    }
}

impl AggregateRoot for Account {}
