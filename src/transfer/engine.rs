//! Atomic transfer with id-ordered balance updates

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{TransferTxParams, TransferTxResult};
use crate::store::{
    AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, Queries, Store,
    StoreError,
};

/// Stateless transfer engine over a [`Store`]
///
/// Holds no locks or mutable state of its own; all mutual exclusion comes
/// from the store's row locks. Safe to share and call concurrently.
pub struct TransferEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> TransferEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Transfers `amount` from one account to another.
    ///
    /// Either everything commits and the result carries the created rows and
    /// both accounts' post-transfer balances, or nothing is written and the
    /// store's error is returned unchanged. Conflicts are not retried.
    pub async fn transfer(&self, params: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        let TransferTxParams {
            from_account_id,
            to_account_id,
            amount,
        } = params;

        if amount <= 0 {
            return Err(StoreError::InvalidArgument(format!(
                "transfer amount must be positive, got {amount}"
            )));
        }

        debug!(from_account_id, to_account_id, amount, "Transfer started");

        let result = self
            .store
            .run_atomic(move |q| {
                Box::pin(async move {
                    let transfer = q
                        .create_transfer(CreateTransferParams {
                            from_account_id,
                            to_account_id,
                            amount,
                        })
                        .await?;

                    let from_entry = q
                        .create_entry(CreateEntryParams {
                            account_id: from_account_id,
                            amount: -amount,
                        })
                        .await?;

                    let to_entry = q
                        .create_entry(CreateEntryParams {
                            account_id: to_account_id,
                            amount,
                        })
                        .await?;

                    if from_account_id < to_account_id {
                        add_money(q, from_account_id, -amount, to_account_id, amount).await?;
                    } else {
                        add_money(q, to_account_id, amount, from_account_id, -amount).await?;
                    }

                    // Re-read so a self-transfer reports the final balance on both sides
                    let from_account = q.get_account(from_account_id).await?;
                    let to_account = q.get_account(to_account_id).await?;

                    Ok(TransferTxResult {
                        transfer,
                        from_account,
                        to_account,
                        from_entry,
                        to_entry,
                    })
                })
            })
            .await;

        match &result {
            Ok(res) => info!(
                transfer_id = res.transfer.id,
                from_account_id,
                to_account_id,
                amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                from_account_id,
                to_account_id,
                amount,
                error = %e,
                code = e.code(),
                "Transfer aborted"
            ),
        }

        result
    }
}

/// Applies two balance deltas in the order given.
///
/// Callers pass the lower account id as `account_id1`. Each update takes
/// that row's lock until the unit ends.
async fn add_money<Q: Queries + ?Sized>(
    q: &mut Q,
    account_id1: i64,
    amount1: i64,
    account_id2: i64,
    amount2: i64,
) -> Result<(), StoreError> {
    q.add_account_balance(AddAccountBalanceParams {
        id: account_id1,
        amount: amount1,
    })
    .await?;

    q.add_account_balance(AddAccountBalanceParams {
        id: account_id2,
        amount: amount2,
    })
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::future::BoxFuture;

    use super::*;
    use crate::store::{
        Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
        MemoryStore, Transfer,
    };

    /// Records the order of balance updates, delegating nothing
    #[derive(Default)]
    struct RecordingQueries {
        balance_updates: Vec<i64>,
    }

    #[async_trait]
    impl Queries for RecordingQueries {
        async fn create_account(
            &mut self,
            _params: CreateAccountParams,
        ) -> Result<Account, StoreError> {
            unreachable!()
        }

        async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
            Ok(Account {
                id,
                owner: "recorder".to_string(),
                balance: 0,
                currency: "USD".to_string(),
                created_at: chrono::Utc::now(),
            })
        }

        async fn list_accounts(
            &mut self,
            _params: ListAccountsParams,
        ) -> Result<Vec<Account>, StoreError> {
            unreachable!()
        }

        async fn add_account_balance(
            &mut self,
            params: AddAccountBalanceParams,
        ) -> Result<Account, StoreError> {
            self.balance_updates.push(params.id);
            self.get_account(params.id).await
        }

        async fn create_entry(&mut self, params: CreateEntryParams) -> Result<Entry, StoreError> {
            Ok(Entry {
                id: 1,
                account_id: params.account_id,
                amount: params.amount,
                created_at: chrono::Utc::now(),
            })
        }

        async fn get_entry(&mut self, _id: i64) -> Result<Entry, StoreError> {
            unreachable!()
        }

        async fn list_entries(
            &mut self,
            _params: ListEntriesParams,
        ) -> Result<Vec<Entry>, StoreError> {
            unreachable!()
        }

        async fn create_transfer(
            &mut self,
            params: CreateTransferParams,
        ) -> Result<Transfer, StoreError> {
            Ok(Transfer {
                id: 1,
                from_account_id: params.from_account_id,
                to_account_id: params.to_account_id,
                amount: params.amount,
                created_at: chrono::Utc::now(),
            })
        }

        async fn get_transfer(&mut self, _id: i64) -> Result<Transfer, StoreError> {
            unreachable!()
        }

        async fn list_transfers(
            &mut self,
            _params: ListTransfersParams,
        ) -> Result<Vec<Transfer>, StoreError> {
            unreachable!()
        }
    }

    /// Store whose units run against a [`RecordingQueries`] and keep the log
    #[derive(Default)]
    struct RecordingStore {
        updates: Mutex<Vec<Vec<i64>>>,
    }

    #[async_trait]
    impl Store for RecordingStore {
        async fn run_atomic<T, F>(&self, f: F) -> Result<T, StoreError>
        where
            T: Send + 'static,
            F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
                + Send
                + 'static,
        {
            let mut q = RecordingQueries::default();
            let result = f(&mut q).await;
            self.updates.lock().unwrap().push(q.balance_updates);
            result
        }

        async fn execute<T, F>(&self, f: F) -> Result<T, StoreError>
        where
            T: Send + 'static,
            F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
                + Send
                + 'static,
        {
            self.run_atomic(f).await
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    async fn update_order(from: i64, to: i64) -> Vec<i64> {
        let store = Arc::new(RecordingStore::default());
        let engine = TransferEngine::new(Arc::clone(&store));
        engine
            .transfer(TransferTxParams {
                from_account_id: from,
                to_account_id: to,
                amount: 10,
            })
            .await
            .unwrap();
        let mut updates = store.updates.lock().unwrap();
        updates.pop().unwrap()
    }

    #[tokio::test]
    async fn test_lower_id_is_updated_first_in_both_directions() {
        assert_eq!(update_order(3, 9).await, vec![3, 9]);
        assert_eq!(update_order(9, 3).await, vec![3, 9]);
    }

    #[tokio::test]
    async fn test_self_transfer_updates_same_row_twice() {
        assert_eq!(update_order(5, 5).await, vec![5, 5]);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_before_any_write() {
        let store = Arc::new(RecordingStore::default());
        let engine = TransferEngine::new(Arc::clone(&store));

        for amount in [0, -5] {
            let err = engine
                .transfer(TransferTxParams {
                    from_account_id: 1,
                    to_account_id: 2,
                    amount,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidArgument(_)));
        }
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_is_cloneable_over_shared_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = TransferEngine::new(Arc::clone(&store));
        let cloned = engine.clone();
        assert!(Arc::ptr_eq(engine.store(), cloned.store()));
    }
}
