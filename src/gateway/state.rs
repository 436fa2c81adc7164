use std::sync::Arc;

use crate::store::Store;
use crate::transfer::TransferEngine;

/// Gateway shared state
pub struct AppState<S> {
    /// Ledger store, used directly for reads and single-row writes
    pub store: Arc<S>,
    /// Transfer engine over the same store
    pub engine: TransferEngine<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        let engine = TransferEngine::new(Arc::clone(&store));
        Self { store, engine }
    }
}
