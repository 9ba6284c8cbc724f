//! Infrastructure layer: the in-memory transactional store, the repository
//! adapter and the unit of work.

pub mod error;
pub mod records;
pub mod repository;
pub mod store;
pub mod unit_of_work;

#[cfg(test)]
mod integration_tests;

pub use error::LedgerError;
pub use records::{
    AccountRecord, CardRecord, SubAccountRecord, SubAccountRecordKind, TransactionRecord,
};
pub use repository::InMemoryAccountRepository;
pub use store::{MemoryStore, StoreError};
pub use unit_of_work::{UnitOfWork, WorkManager};
