//! In-memory store backend
//!
//! Mirrors the parts of PostgreSQL behavior the transfer engine depends on:
//!
//! - **Row locks**: `add_account_balance` acquires a per-account async mutex
//!   and keeps it until the unit ends. Two units locking the same pair of
//!   rows in opposite orders really do deadlock here, exactly as they would
//!   in the database.
//! - **Read committed**: reads see committed rows plus the unit's own
//!   uncommitted writes.
//! - **Atomic publish**: a unit's writes become visible under a single table
//!   write lock at commit, before its row locks are released.
//! - **Sequences**: ids are drawn from counters that are never rolled back.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::error::StoreError;
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, page,
};
use super::queries::Queries;
use super::Store;

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
}

#[derive(Default)]
struct Inner {
    tables: RwLock<Tables>,
    row_locks: DashMap<i64, Arc<Mutex<()>>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
}

impl Inner {
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::Relaxed) + 1
}

/// In-process [`Store`]; cloning shares the same tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn run_atomic<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
            + Send
            + 'static,
    {
        let mut unit = MemoryUnit::begin(Arc::clone(&self.inner), false);
        let result = f(&mut unit).await;
        match result {
            Ok(value) => {
                unit.commit();
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Atomic unit failed, rolling back");
                // Dropping the unit discards its writes and frees its row locks
                drop(unit);
                Err(err)
            }
        }
    }

    async fn execute<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
            + Send
            + 'static,
    {
        let mut unit = MemoryUnit::begin(Arc::clone(&self.inner), true);
        f(&mut unit).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Handle for one unit of work against a [`MemoryStore`]
///
/// Uncommitted writes live here until [`MemoryUnit::commit`]. With
/// `autocommit` set, every write commits immediately.
struct MemoryUnit {
    inner: Arc<Inner>,
    autocommit: bool,
    locks: HashMap<i64, OwnedMutexGuard<()>>,
    accounts: HashMap<i64, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl MemoryUnit {
    fn begin(inner: Arc<Inner>, autocommit: bool) -> Self {
        Self {
            inner,
            autocommit,
            locks: HashMap::new(),
            accounts: HashMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        }
    }

    /// Publishes buffered writes, then releases row locks
    fn commit(&mut self) {
        {
            let mut tables = self
                .inner
                .tables
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, account) in self.accounts.drain() {
                tables.accounts.insert(id, account);
            }
            for entry in self.entries.drain(..) {
                tables.entries.insert(entry.id, entry);
            }
            for transfer in self.transfers.drain(..) {
                tables.transfers.insert(transfer.id, transfer);
            }
        }
        self.locks.clear();
    }

    fn after_write(&mut self) {
        if self.autocommit {
            self.commit();
        }
    }

    /// Blocks until this unit owns the row lock for `id`. Re-entrant.
    async fn lock_row(&mut self, id: i64) {
        if self.locks.contains_key(&id) {
            return;
        }
        let lock = Arc::clone(self.inner.row_locks.entry(id).or_default().value());
        let guard = lock.lock_owned().await;
        self.locks.insert(id, guard);
        // A database round trip sits between two statements; give other
        // units the same chance to run while this lock is held.
        tokio::task::yield_now().await;
    }

    /// Latest version of an account visible to this unit
    fn visible_account(&self, id: i64) -> Option<Account> {
        self.accounts
            .get(&id)
            .cloned()
            .or_else(|| self.inner.read().accounts.get(&id).cloned())
    }

    fn require_account(&self, id: i64, what: &str) -> Result<(), StoreError> {
        if self.visible_account(id).is_some() {
            Ok(())
        } else {
            Err(StoreError::ConstraintViolation(format!(
                "{what} references missing account {id}"
            )))
        }
    }
}

#[async_trait]
impl Queries for MemoryUnit {
    async fn create_account(
        &mut self,
        params: CreateAccountParams,
    ) -> Result<Account, StoreError> {
        let account = Account {
            id: next_id(&self.inner.account_seq),
            owner: params.owner,
            balance: params.balance,
            currency: params.currency,
            created_at: Utc::now(),
        };
        self.accounts.insert(account.id, account.clone());
        self.after_write();
        Ok(account)
    }

    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        self.visible_account(id).ok_or(StoreError::NotFound)
    }

    async fn list_accounts(
        &mut self,
        params: ListAccountsParams,
    ) -> Result<Vec<Account>, StoreError> {
        let mut merged = self.inner.read().accounts.clone();
        merged.extend(self.accounts.iter().map(|(id, a)| (*id, a.clone())));
        Ok(page(merged.into_values(), params.limit, params.offset))
    }

    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> Result<Account, StoreError> {
        self.lock_row(params.id).await;

        // Row lock held: the committed value cannot change under us
        let mut account = self.visible_account(params.id).ok_or(StoreError::NotFound)?;
        account.balance = account.balance.checked_add(params.amount).ok_or_else(|| {
            StoreError::ConstraintViolation(format!(
                "balance of account {} out of range",
                params.id
            ))
        })?;
        self.accounts.insert(account.id, account.clone());
        self.after_write();
        Ok(account)
    }

    async fn create_entry(&mut self, params: CreateEntryParams) -> Result<Entry, StoreError> {
        self.require_account(params.account_id, "entry")?;
        let entry = Entry {
            id: next_id(&self.inner.entry_seq),
            account_id: params.account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        self.after_write();
        Ok(entry)
    }

    async fn get_entry(&mut self, id: i64) -> Result<Entry, StoreError> {
        if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
            return Ok(entry.clone());
        }
        self.inner
            .read()
            .entries
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_entries(&mut self, params: ListEntriesParams) -> Result<Vec<Entry>, StoreError> {
        let mut merged: BTreeMap<i64, Entry> = self
            .inner
            .read()
            .entries
            .values()
            .filter(|e| e.account_id == params.account_id)
            .map(|e| (e.id, e.clone()))
            .collect();
        merged.extend(
            self.entries
                .iter()
                .filter(|e| e.account_id == params.account_id)
                .map(|e| (e.id, e.clone())),
        );
        Ok(page(merged.into_values(), params.limit, params.offset))
    }

    async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, StoreError> {
        if params.amount <= 0 {
            return Err(StoreError::ConstraintViolation(
                "transfer amount must be positive".to_string(),
            ));
        }
        self.require_account(params.from_account_id, "transfer")?;
        self.require_account(params.to_account_id, "transfer")?;
        let transfer = Transfer {
            id: next_id(&self.inner.transfer_seq),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        self.after_write();
        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: i64) -> Result<Transfer, StoreError> {
        if let Some(transfer) = self.transfers.iter().find(|t| t.id == id) {
            return Ok(transfer.clone());
        }
        self.inner
            .read()
            .transfers
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, StoreError> {
        let mut merged: BTreeMap<i64, Transfer> = self
            .inner
            .read()
            .transfers
            .values()
            .filter(|t| params.matches(t))
            .map(|t| (t.id, t.clone()))
            .collect();
        merged.extend(
            self.transfers
                .iter()
                .filter(|t| params.matches(t))
                .map(|t| (t.id, t.clone())),
        );
        Ok(page(merged.into_values(), params.limit, params.offset))
    }
}
