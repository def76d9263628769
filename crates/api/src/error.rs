//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use fulfillment::FulfillmentError;
use ledger::LedgerError;
use payment::PaymentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed identity headers.
    Unauthorized(String),
    /// The principal is not allowed to perform this operation.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement or lifecycle error.
    Fulfillment(FulfillmentError),
    /// Catalog error.
    Catalog(CatalogError),
    /// Ledger error.
    Ledger(LedgerError),
    /// Payment error.
    Payment(PaymentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::EmptyOrder
        | FulfillmentError::MissingAddress
        | FulfillmentError::InvalidQuantity { .. }
        | FulfillmentError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        FulfillmentError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        FulfillmentError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
        FulfillmentError::Ledger(_) | FulfillmentError::Catalog(_) if err.is_retryable() => {
            tracing::error!(error = %err, "storage failure during fulfillment");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        FulfillmentError::Ledger(inner) => ledger_status(inner, &err),
        FulfillmentError::Catalog(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::ProductAlreadyExists { .. } => (StatusCode::CONFLICT, err.to_string()),
        CatalogError::InvalidProduct { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::Database(_) => {
            tracing::error!(error = %err, "catalog storage failure");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    let (status, message) = ledger_status(&err, &err);
    if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %message, "ledger failure");
    }
    (status, message)
}

fn ledger_status(err: &LedgerError, display: &dyn std::fmt::Display) -> (StatusCode, String) {
    let status = match err {
        LedgerError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InvalidTransition { .. } | LedgerError::OrderClosed { .. } => {
            StatusCode::CONFLICT
        }
        LedgerError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, display.to_string())
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::Gateway(_) => {
            tracing::error!(error = %err, "payment gateway failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        PaymentError::Ledger(inner) => ledger_status(inner, &err),
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}
