//! Ledger entity rows and the parameter structs used to write them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Rows
// ============================================================================

/// Balance-holding account
///
/// `balance` is in minor currency units and may go negative; no overdraft
/// rule is enforced anywhere in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable balance change against one account (negative = debit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of a directed, positive-amount movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Write / query parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

/// Adds `amount` (signed) to the balance of account `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddAccountBalanceParams {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAccountsParams {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntriesParams {
    pub account_id: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Matches transfers where `from_account_id` is the source OR
/// `to_account_id` is the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTransfersParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub limit: i64,
    pub offset: i64,
}

impl ListTransfersParams {
    pub(crate) fn matches(&self, transfer: &Transfer) -> bool {
        transfer.from_account_id == self.from_account_id
            || transfer.to_account_id == self.to_account_id
    }
}

/// Applies `limit`/`offset` paging to an id-ordered sequence.
///
/// Negative values behave like zero.
pub(crate) fn page<T>(rows: impl IntoIterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}
