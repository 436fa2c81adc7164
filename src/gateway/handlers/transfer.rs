//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{info, warn};
use validator::Validate;

use crate::gateway::state::AppState;
use crate::gateway::types::{
    ApiError, ApiResult, Currency, TransferRequest, error_codes, ok,
};
use crate::store::{Account, Store, StoreError, Transfer};
use crate::transfer::{TransferTxParams, TransferTxResult};

/// POST /transfers
///
/// Checks, in order: request body, source account exists and holds
/// `currency`, destination account exists and holds `currency`. Only then
/// is the transfer run.
pub async fn create_transfer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferTxResult> {
    let Json(req) = payload?;
    req.validate()?;

    valid_account(state.store.as_ref(), req.from_account_id, req.currency).await?;
    valid_account(state.store.as_ref(), req.to_account_id, req.currency).await?;

    let result = state
        .engine
        .transfer(TransferTxParams {
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: req.amount,
        })
        .await
        .map_err(|e| {
            warn!(
                from_account_id = req.from_account_id,
                to_account_id = req.to_account_id,
                amount = req.amount,
                error = %e,
                "Transfer rejected"
            );
            ApiError::from(e)
        })?;

    info!(transfer_id = result.transfer.id, currency = %req.currency, "Transfer accepted");
    ok(result)
}

/// GET /transfers/{id}
pub async fn get_transfer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> ApiResult<Transfer> {
    if id < 1 {
        return ApiError::bad_request(format!("invalid transfer id {id}")).into_err();
    }

    let transfer = state
        .store
        .execute(move |q| Box::pin(async move { q.get_transfer(id).await }))
        .await?;
    ok(transfer)
}

/// Loads account `id` and checks it holds `currency`.
///
/// A missing account is 404; any other store failure is 500.
async fn valid_account<S: Store>(
    store: &S,
    id: i64,
    currency: Currency,
) -> Result<Account, ApiError> {
    let account = store
        .execute(move |q| Box::pin(async move { q.get_account(id).await }))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found(format!("account [{id}] not found")),
            other => ApiError::internal(other.to_string()),
        })?;

    if account.currency != currency.as_str() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            error_codes::CURRENCY_MISMATCH,
            format!(
                "account [{id}] currency mismatch: {} vs {currency}",
                account.currency
            ),
        ));
    }

    Ok(account)
}
