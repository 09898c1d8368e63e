//! Error handling for the Kitchen Ledger service
//!
//! Every failure is returned as a structured response; callers surface the
//! message verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::Shortfall;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Catalog errors
    #[error("Dish already exists: {0}")]
    DuplicateDish(String),

    #[error("Unknown ingredient(s): {}", .0.join(", "))]
    UnknownIngredient(Vec<String>),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    // Consumption errors
    #[error("Insufficient stock: {}", format_shortfalls(.0))]
    InsufficientStock(Vec<Shortfall>),

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Arithmetic on `field` left the range a `Decimal` can hold
    pub fn overflow(field: impl Into<String>) -> Self {
        Self::validation(field, "Value is too large to compute")
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateDish(_) => "DUPLICATE_DISH",
            AppError::UnknownIngredient(_) => "UNKNOWN_INGREDIENT",
            AppError::ConfirmationRequired(_) => "CONFIRMATION_REQUIRED",
            AppError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

fn format_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code,
                    message: message.clone(),
                    field: Some(field.clone()),
                    details: None,
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code,
                    message: msg.clone(),
                    field: None,
                    details: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code,
                    message: format!("{} not found", resource),
                    field: None,
                    details: None,
                },
            ),
            AppError::DuplicateDish(name) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code,
                    message: format!("A dish named '{}' already exists", name),
                    field: Some("name".to_string()),
                    details: None,
                },
            ),
            AppError::UnknownIngredient(names) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code,
                    message: format!("Ingredient(s) not found in inventory: {}", names.join(", ")),
                    field: Some("ingredients".to_string()),
                    details: Some(serde_json::json!({ "unresolved": names })),
                },
            ),
            AppError::ConfirmationRequired(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code,
                    message: msg.clone(),
                    field: Some("confirm".to_string()),
                    details: None,
                },
            ),
            AppError::InsufficientStock(shortfalls) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code,
                    message: format!("Not enough stock: {}", format_shortfalls(shortfalls)),
                    field: None,
                    details: Some(serde_json::json!({ "shortfalls": shortfalls })),
                },
            ),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code,
                    message: format!("Storage error: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code,
                    message: format!("Configuration error: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code,
                    message: msg.clone(),
                    field: None,
                    details: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code,
                    message: "An internal server error occurred".to_string(),
                    field: None,
                    details: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::validation(field.to_string(), message)
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
