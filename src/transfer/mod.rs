//! Transfer Engine
//!
//! Moves money between two accounts as one atomic unit: one transfer row,
//! a debit entry, a credit entry and two balance updates.
//!
//! # Lock order
//!
//! Balance updates take row locks that are held until commit. Both updates
//! are always issued for the lower account id first, whichever side is the
//! source. Two transfers over the same pair of accounts, in either
//! direction, therefore queue on the same first lock and can never wait on
//! each other in a cycle.
//!
//! ```text
//! from < to:  UPDATE from (-amount)  ->  UPDATE to (+amount)
//! from >= to: UPDATE to (+amount)    ->  UPDATE from (-amount)
//! ```

pub mod engine;
pub mod types;


pub use engine::TransferEngine;
pub use types::{TransferTxParams, TransferTxResult};
