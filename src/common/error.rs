// src/common/error.rs

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

const BASIC_CHALLENGE: &str = r#"Basic realm="invoicing""#;

// Single error type for handlers, services and stores.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    // Malformed bodies, bad path parameters, unknown enum values.
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Authentication required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage call exceeded its deadline")]
    StoreTimeout,

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        AppError::InvalidPayload("Invalid request payload".into())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::InvalidPayload("Invalid id".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                collect_validation_details(&errors, "", &mut details);
                let body = Json(json!({
                    "error": "Missing or invalid fields",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidPayload(message) => {
                let body = Json(json!({ "error": message }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::MissingCredentials => return unauthorized("Authentication required"),
            AppError::InvalidCredentials => return unauthorized("Invalid credentials"),
            AppError::InvoiceNotFound => (StatusCode::NOT_FOUND, "Invoice not found"),
            AppError::CustomerNotFound => (StatusCode::NOT_FOUND, "Customer not found"),
            AppError::UsernameAlreadyExists => (StatusCode::CONFLICT, "Username already exists"),

            // Everything else is a storage or internal failure: log the cause, hide it from the client.
            ref e => {
                tracing::error!("Internal server error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// Flattens nested errors into keys like `line_items[1].quantity`.
fn collect_validation_details(
    errors: &ValidationErrors,
    prefix: &str,
    details: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(key, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_details(inner, &key, details),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_details(inner, &format!("{key}[{index}]"), details);
                }
            }
        }
    }
}

fn unauthorized(message: &str) -> Response {
    let body = Json(json!({ "error": message }));
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, BASIC_CHALLENGE)],
        body,
    )
        .into_response()
}
