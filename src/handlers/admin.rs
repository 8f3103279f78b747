// src/handlers/admin.rs

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{CreateUserPayload, MessageResponse},
};

// Bootstrap route, intentionally left outside the admin guard.
#[utoipa::path(
    post,
    path = "/api/admin/create-user",
    tag = "Admin",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Admin user created", body = MessageResponse),
        (status = 400, description = "Missing username or password"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    app_state.auth_service.create_admin(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Admin user created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Admin",
    responses(
        (status = 200, description = "Service is up", body = String)
    )
)]
pub async fn health() -> &'static str {
    "OK"
}
