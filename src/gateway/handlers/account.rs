//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use tracing::info;
use validator::Validate;

use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResult, CreateAccountRequest, PageQuery, ok};
use crate::store::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams, Store,
};

/// POST /accounts
///
/// New accounts always start with a zero balance.
pub async fn create_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = payload?;
    req.validate()?;

    let params = CreateAccountParams {
        owner: req.owner,
        balance: 0,
        currency: req.currency.to_string(),
    };
    let account = state
        .store
        .execute(move |q| Box::pin(async move { q.create_account(params).await }))
        .await?;

    info!(
        account_id = account.id,
        owner = %account.owner,
        currency = %account.currency,
        "Account created"
    );
    ok(account)
}

/// GET /accounts/{id}
pub async fn get_account<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> ApiResult<Account> {
    if id < 1 {
        return ApiError::bad_request(format!("invalid account id {id}")).into_err();
    }

    let account = state
        .store
        .execute(move |q| Box::pin(async move { q.get_account(id).await }))
        .await?;
    ok(account)
}

/// GET /accounts?page_id=&page_size=
pub async fn list_accounts<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Account>> {
    page.validate()?;

    let params = ListAccountsParams {
        limit: page.limit(),
        offset: page.offset(),
    };
    let accounts = state
        .store
        .execute(move |q| Box::pin(async move { q.list_accounts(params).await }))
        .await?;
    ok(accounts)
}

/// GET /accounts/{id}/entries?page_id=&page_size=
pub async fn list_entries<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(account_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Entry>> {
    if account_id < 1 {
        return ApiError::bad_request(format!("invalid account id {account_id}")).into_err();
    }
    page.validate()?;

    let params = ListEntriesParams {
        account_id,
        limit: page.limit(),
        offset: page.offset(),
    };
    let entries = state
        .store
        .execute(move |q| Box::pin(async move { q.list_entries(params).await }))
        .await?;
    ok(entries)
}
