//! Unit of work: bounds the lifetime of one store transaction.
//!
//! `WorkManager::scope` is the usual entry point: it begins a unit, runs the
//! body, commits on `Ok` and rolls back on `Err`, returning the body's error
//! unchanged. Exactly one commit-or-rollback happens per scope, however many
//! repository calls the body makes. `WorkManager::unit` is the manually
//! driven equivalent for callers needing finer control.

use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::repository::InMemoryAccountRepository;
use crate::store::{MemoryStore, StoreError};

/// Hands out units of work over one shared store.
#[derive(Debug, Clone)]
pub struct WorkManager {
    store: Arc<MemoryStore>,
}

impl WorkManager {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Begin a manually driven unit of work. The caller must finish it with
    /// `commit` or `rollback`; a unit dropped unfinished rolls back.
    pub fn unit(&self) -> Result<UnitOfWork, StoreError> {
        self.store.begin()?;
        Ok(UnitOfWork {
            store: Arc::clone(&self.store),
            accounts: OnceLock::new(),
            finished: false,
        })
    }

    /// Run `body` inside a unit of work: commit on `Ok`, roll back on `Err`.
    ///
    /// The body's error is returned unchanged; a rollback failure on the way
    /// out is logged, never surfaced over the original error.
    pub fn scope<T, E>(&self, body: impl FnOnce(&UnitOfWork) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let unit = self.unit()?;
        match body(&unit) {
            Ok(value) => {
                unit.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = unit.rollback() {
                    warn!(error = %rollback_err, "rollback failed while unwinding a scope");
                }
                Err(err)
            }
        }
    }
}

/// One store transaction plus the repositories operating inside it.
///
/// Repositories are memoized per unit: repeated retrieval within one scope
/// returns the same instance, sharing the transaction's view of the store.
#[derive(Debug)]
pub struct UnitOfWork {
    store: Arc<MemoryStore>,
    accounts: OnceLock<Arc<InMemoryAccountRepository>>,
    finished: bool,
}

impl UnitOfWork {
    /// The account repository bound to this unit's transaction.
    pub fn accounts(&self) -> Arc<InMemoryAccountRepository> {
        self.accounts
            .get_or_init(|| Arc::new(InMemoryAccountRepository::new(Arc::clone(&self.store))))
            .clone()
    }

    /// Merge this unit's staged writes into the store.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.store.commit()
    }

    /// Discard this unit's staged writes.
    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.store.rollback()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // A unit abandoned mid-flight must not leave the transaction open.
        if !self.finished {
            let _ = self.store.rollback();
        }
    }
}
