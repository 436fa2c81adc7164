//! PostgreSQL store backend
//!
//! `add_account_balance` is a single `UPDATE ... RETURNING`, so the row lock
//! it takes lives until the surrounding transaction ends. Lock order across
//! accounts is therefore decided entirely by the order of those calls.

use std::ops::DerefMut;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};

use super::error::StoreError;
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer,
};
use super::queries::Queries;
use super::Store;

/// [`Queries`] over any PostgreSQL connection: a pooled connection for
/// autocommit access, or an open transaction for atomic units.
pub struct PgQueries<C> {
    conn: C,
}

impl<C> PgQueries<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

#[async_trait]
impl<C> Queries for PgQueries<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn create_account(
        &mut self,
        params: CreateAccountParams,
    ) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (owner, balance, currency)
               VALUES ($1, $2, $3)
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(&params.owner)
        .bind(params.balance)
        .bind(&params.currency)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(account)
    }

    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(account)
    }

    async fn list_accounts(
        &mut self,
        params: ListAccountsParams,
    ) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts
               ORDER BY id
               LIMIT $1 OFFSET $2"#,
        )
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(accounts)
    }

    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"UPDATE accounts
               SET balance = balance + $1
               WHERE id = $2
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(params.amount)
        .bind(params.id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(account)
    }

    async fn create_entry(&mut self, params: CreateEntryParams) -> Result<Entry, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"INSERT INTO entries (account_id, amount)
               VALUES ($1, $2)
               RETURNING id, account_id, amount, created_at"#,
        )
        .bind(params.account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(entry)
    }

    async fn get_entry(&mut self, id: i64) -> Result<Entry, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(entry)
    }

    async fn list_entries(&mut self, params: ListEntriesParams) -> Result<Vec<Entry>, StoreError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries
               WHERE account_id = $1
               ORDER BY id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(params.account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(entries)
    }

    async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"INSERT INTO transfers (from_account_id, to_account_id, amount)
               VALUES ($1, $2, $3)
               RETURNING id, from_account_id, to_account_id, amount, created_at"#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: i64) -> Result<Transfer, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(transfer)
    }

    async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, StoreError> {
        let transfers = sqlx::query_as::<_, Transfer>(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers
               WHERE from_account_id = $1 OR to_account_id = $2
               ORDER BY id
               LIMIT $3 OFFSET $4"#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(transfers)
    }
}

/// PostgreSQL-backed [`Store`]
///
/// Transactions run at the server's default isolation level (read
/// committed).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn run_atomic<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
            + Send
            + 'static,
    {
        let tx = self.pool.begin().await?;
        let mut queries = PgQueries::new(tx);

        // If this future is dropped mid-way the sqlx transaction is dropped
        // with it, which rolls back on the connection's next use.
        match f(&mut queries).await {
            Ok(value) => {
                queries.into_inner().commit().await?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Atomic unit failed, rolling back");
                if let Err(rb_err) = queries.into_inner().rollback().await {
                    warn!(error = %err, rollback_error = %rb_err, "Rollback failed");
                }
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
        let conn = self.pool.acquire().await?;
        let mut queries = PgQueries::new(conn);
        f(&mut queries).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
