// src/handlers/customers.rs

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::customer::{CreateCustomerPayload, Customer},
};

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Missing or invalid fields")
    ),
    security(("basic_auth" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateCustomerPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let customer = app_state.customer_service.create_customer(payload).await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(
        ("id" = i64, Path, description = "Customer id")
    ),
    responses(
        (status = 200, description = "Customer record, including auto-created placeholders", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    security(("basic_auth" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;

    let customer = app_state.customer_service.get_customer(id).await?;

    Ok((StatusCode::OK, Json(customer)))
}
