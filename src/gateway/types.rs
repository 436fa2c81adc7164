//! Gateway request/response types
//!
//! - `ApiResponse<T>`: unified `{code, msg, data}` envelope
//! - `ApiError`: error carrying an HTTP status, converted from [`StoreError`]
//! - Request DTOs, validated with `validator` before touching the store

use std::fmt;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::store::StoreError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const CURRENCY_MISMATCH: i32 = 1002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONSTRAINT_VIOLATION: i32 = 4221;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &e {
            StoreError::NotFound => error_codes::NOT_FOUND,
            StoreError::InvalidArgument(_) => error_codes::INVALID_PARAMETER,
            StoreError::ConstraintViolation(_) => error_codes::CONSTRAINT_VIOLATION,
            StoreError::Transient(_) => error_codes::SERVICE_UNAVAILABLE,
            StoreError::Database(_) => error_codes::INTERNAL_ERROR,
        };
        Self::new(status, code, e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, msg = %self.msg, "Request failed");
        }
        (self.status, Json(ApiResponse::error(self.code, self.msg))).into_response()
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Supported account currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Cad,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cad => "CAD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 64))]
    pub owner: String,
    pub currency: Currency,
}

/// `page_id` is 1-based
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Row offset of the page. Saturates on out-of-range input; call after
    /// `validate()` to get a meaningful value.
    pub fn offset(&self) -> i64 {
        self.page_id
            .saturating_sub(1)
            .saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: i64,
    #[validate(range(min = 1))]
    pub to_account_id: i64,
    #[validate(range(min = 1))]
    pub amount: i64,
    pub currency: Currency,
}
