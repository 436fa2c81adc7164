//! HTTP gateway
//!
//! Thin axum layer over the [`Store`] and [`TransferEngine`](crate::transfer::TransferEngine).
//! Handlers validate input, map store errors onto HTTP statuses and wrap
//! every body in the `{code, msg, data}` envelope.

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::store::Store;
use state::AppState;

/// Builds the gateway router
pub fn router<S: Store>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .route(
            "/accounts",
            post(handlers::create_account::<S>).get(handlers::list_accounts::<S>),
        )
        .route("/accounts/{id}", get(handlers::get_account::<S>))
        .route("/accounts/{id}/entries", get(handlers::list_entries::<S>))
        .route("/transfers", post(handlers::create_transfer::<S>))
        .route("/transfers/{id}", get(handlers::get_transfer::<S>))
        .with_state(state)
}

/// Binds `addr` and serves until the process exits
pub async fn run_server<S: Store>(addr: &str, state: Arc<AppState<S>>) -> std::io::Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Gateway listening");

    axum::serve(listener, app).await
}
