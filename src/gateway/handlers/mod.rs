pub mod account;
pub mod health;
pub mod transfer;

pub use account::{create_account, get_account, list_accounts, list_entries};
pub use health::health_check;
pub use transfer::{create_transfer, get_transfer};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures::future::BoxFuture;

    use crate::gateway::state::AppState;
    use crate::store::{MemoryStore, Queries, Store, StoreError};

    pub fn memory_state() -> Arc<AppState<MemoryStore>> {
        Arc::new(AppState::new(Arc::new(MemoryStore::new())))
    }

    /// Store whose backend is unreachable
    pub struct UnavailableStore;

    #[async_trait]
    impl Store for UnavailableStore {
        async fn run_atomic<T, F>(&self, _f: F) -> Result<T, StoreError>
        where
            T: Send + 'static,
            F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
                + Send
                + 'static,
        {
            Err(StoreError::Transient("connection refused".into()))
        }

        async fn execute<T, F>(&self, _f: F) -> Result<T, StoreError>
        where
            T: Send + 'static,
            F: for<'t> FnOnce(&'t mut dyn Queries) -> BoxFuture<'t, Result<T, StoreError>>
                + Send
                + 'static,
        {
            Err(StoreError::Transient("connection refused".into()))
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Err(StoreError::Transient("connection refused".into()))
        }
    }

    pub fn unavailable_state() -> Arc<AppState<UnavailableStore>> {
        Arc::new(AppState::new(Arc::new(UnavailableStore)))
    }
}
