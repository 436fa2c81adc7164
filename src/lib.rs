//! Bank Ledger - double-entry money transfers
//!
//! Accounts hold an integer balance in minor units. Every transfer writes
//! one transfer row, a debit entry and a credit entry, and moves both
//! balances, all inside a single atomic unit.
//!
//! # Modules
//!
//! - [`store`] - Ledger storage: entity queries and atomic units (PostgreSQL, in-memory)
//! - [`transfer`] - Transfer engine with id-ordered row locking
//! - [`gateway`] - HTTP request layer
//! - [`db`] - PostgreSQL pool and schema
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod transfer;

pub use store::{MemoryStore, PgStore, Store, StoreError};
pub use transfer::{TransferEngine, TransferTxParams, TransferTxResult};
