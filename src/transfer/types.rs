//! Transfer engine input and output

use serde::{Deserialize, Serialize};

use crate::store::{Account, Entry, Transfer};

/// Input to [`TransferEngine::transfer`](super::TransferEngine::transfer)
///
/// Source and destination may be the same account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything a committed transfer wrote, with post-commit account balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}
