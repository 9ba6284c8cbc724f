//! Sub-accounts: ordered, append-only collections of transactions.

use serde::{Deserialize, Serialize};

use subledger_core::{Entity, SubAccountId, TransactionReference};

use crate::card::Card;
use crate::error::AccountResult;
use crate::money::Balance;
use crate::transaction::Transaction;

/// Closed set of sub-account kinds. A card sub-account always carries its
/// card, so constructing one without a card is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubAccountKind {
    Regular,
    Card(Card),
}

/// A sub-account of an account: a group of transactions, appended in temporal
/// order. The order matters for reconstruction, not for the balance (the fold
/// is associative and order-independent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccount {
    id: SubAccountId,
    kind: SubAccountKind,
    transactions: Vec<Transaction>,
}

impl SubAccount {
    /// A fresh, empty regular sub-account.
    pub fn regular() -> Self {
        Self::from_parts(SubAccountId::new(), SubAccountKind::Regular, Vec::new())
    }

    /// A fresh, empty sub-account tracking all transactions involving `card`.
    pub fn for_card(card: Card) -> Self {
        Self::from_parts(SubAccountId::new(), SubAccountKind::Card(card), Vec::new())
    }

    /// Rebuild a sub-account from stored parts (repository rehydration).
    pub fn from_parts(
        id: SubAccountId,
        kind: SubAccountKind,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            id,
            kind,
            transactions,
        }
    }

    pub fn kind(&self) -> &SubAccountKind {
        &self.kind
    }

    pub fn is_regular(&self) -> bool {
        matches!(self.kind, SubAccountKind::Regular)
    }

    /// The associated card, for card sub-accounts.
    pub fn card(&self) -> Option<&Card> {
        match &self.kind {
            SubAccountKind::Card(card) => Some(card),
            SubAccountKind::Regular => None,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Append a transaction. Only the owning account records transactions.
    pub(crate) fn record(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// The balance as the fold of all transactions over the zero seed.
    pub fn balance(&self) -> Balance {
        self.transactions
            .iter()
            .fold(Balance::zero(), |acc, t| t.adjust(acc))
    }

    /// Settle every transaction whose reference matches. Several legs of one
    /// operation may target the same sub-account; all of them settle. No
    /// match is a silent no-op. A matching non-pending transaction is an
    /// error (`NotPending`).
    pub fn settle(&mut self, reference: TransactionReference) -> AccountResult<()> {
        for transaction in &mut self.transactions {
            if transaction.reference() == reference {
                transaction.settle()?;
            }
        }
        Ok(())
    }
}

impl Entity for SubAccount {
    type Id = SubAccountId;

    fn id(&self) -> &SubAccountId {
        &self.id
    }
}
