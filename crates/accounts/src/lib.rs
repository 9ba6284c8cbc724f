//! Accounts module (accounts, sub-accounts, money movement).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! `AccountRepository` port is defined here; adapters live in `subledger-infra`.

pub mod account;
pub mod card;
pub mod error;
pub mod money;
pub mod repository;
pub mod services;
pub mod subaccount;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use card::{Card, CardNumber};
pub use error::{AccountError, AccountResult};
pub use money::{Balance, Money};
pub use repository::{AccountRepository, RepositoryError};
pub use services::{
    AccountTransferService, CardPurchaseService, ServiceError, TransactionSettlementService,
};
pub use subaccount::{SubAccount, SubAccountKind};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
