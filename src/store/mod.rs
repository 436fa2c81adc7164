//! Ledger Store
//!
//! Durable, transactional storage of accounts, entries and transfers.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via sqlx, row locks taken by `UPDATE`
//! - [`MemoryStore`]: in-process tables with per-row async locks
//!
//! # Atomic units
//!
//! [`Store::run_atomic`] takes a closure with the same shape as sqlx's
//! `Connection::transaction`:
//!
//! ```text
//! store.run_atomic(move |q| Box::pin(async move {
//!     let entry = q.create_entry(params).await?;
//!     Ok(entry)
//! }))
//! ```
//!
//! `Ok` commits, `Err` rolls back and is returned as-is, and dropping the
//! returned future before completion rolls back as well.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod queries;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer,
};
pub use postgres::PgStore;
pub use queries::Queries;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Storage that can run a sequence of [`Queries`] calls as one unit
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Runs `f` inside a transaction. Commit failures are surfaced, never
    /// retried.
    async fn run_atomic<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
            + Send
            + 'static;

    /// Runs `f` in autocommit mode: each write is durable on its own.
    async fn execute<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
            + Send
            + 'static;

    /// Checks that the backend is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}
