//! Ledger Store error taxonomy
//!
//! Every backend classifies its failures into these variants. The transfer
//! engine returns them untouched; mapping to user-visible behavior belongs
//! to the request layer.

use thiserror::Error;

/// SQLSTATE codes that mean "try again", not "your data is wrong"
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
/// bigint overflow, e.g. `balance + amount` out of range
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound => "NOT_FOUND",
            StoreError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            StoreError::Transient(_) => "TRANSIENT_FAILURE",
            StoreError::InvalidArgument(_) => "INVALID_ARGUMENT",
            StoreError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// HTTP status suggestion for the request layer
    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::NotFound => 404,
            StoreError::InvalidArgument(_) => 400,
            StoreError::ConstraintViolation(_) => 422,
            StoreError::Transient(_) => 503,
            StoreError::Database(_) => 500,
        }
    }

    /// Whether a caller may reasonably retry the whole atomic unit
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                        StoreError::Transient(db_err.to_string())
                    }
                    Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                        StoreError::ConstraintViolation(db_err.to_string())
                    }
                    // Class 23: integrity constraint violation
                    Some(c) if c.starts_with("23") => {
                        StoreError::ConstraintViolation(db_err.to_string())
                    }
                    _ => StoreError::Database(db_err.to_string()),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}
