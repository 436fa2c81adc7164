//! Entity-level operations shared by every store backend

use async_trait::async_trait;

use super::error::StoreError;
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer,
};

/// Single-row CRUD and listing over accounts, entries and transfers.
///
/// Implemented by the handle a backend passes into [`Store::run_atomic`]
/// and [`Store::execute`]; callers only ever see `&mut dyn Queries`.
///
/// [`Store::run_atomic`]: super::Store::run_atomic
/// [`Store::execute`]: super::Store::execute
#[async_trait]
pub trait Queries: Send {
    async fn create_account(&mut self, params: CreateAccountParams)
    -> Result<Account, StoreError>;

    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError>;

    async fn list_accounts(
        &mut self,
        params: ListAccountsParams,
    ) -> Result<Vec<Account>, StoreError>;

    /// Adds a signed delta to an account balance and returns the updated row.
    ///
    /// Inside an atomic unit this takes the account's row lock and holds it
    /// until the unit commits or rolls back.
    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> Result<Account, StoreError>;

    async fn create_entry(&mut self, params: CreateEntryParams) -> Result<Entry, StoreError>;

    async fn get_entry(&mut self, id: i64) -> Result<Entry, StoreError>;

    async fn list_entries(&mut self, params: ListEntriesParams) -> Result<Vec<Entry>, StoreError>;

    async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, StoreError>;

    async fn get_transfer(&mut self, id: i64) -> Result<Transfer, StoreError>;

    async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, StoreError>;
}
