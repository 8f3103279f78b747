// src/handlers/invoices.rs

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::AppError, pagination::PageParams},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::MessageResponse,
        invoice::{CreateInvoicePayload, Invoice, InvoiceStatus, InvoiceSummary, UpdateStatusPayload},
    },
};

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Invoice created with derived totals", body = Invoice),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Missing or rejected credentials")
    ),
    security(("basic_auth" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateInvoicePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let invoice = app_state.invoice_service.create_invoice(payload).await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(PageParams),
    responses(
        (status = 200, description = "Invoice summaries, newest issue date first", body = [InvoiceSummary]),
        (status = 401, description = "Missing or rejected credentials")
    ),
    security(("basic_auth" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    // Unparseable query strings fall back to the default page.
    let params = params
        .map(|Query(params)| params)
        .unwrap_or_else(|rejection| {
            tracing::debug!("Ignoring pagination query: {}", rejection.body_text());
            PageParams::default()
        });

    let invoices = app_state
        .invoice_service
        .list_invoices(params.resolve())
        .await?;

    Ok((StatusCode::OK, Json(invoices)))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(
        ("id" = i64, Path, description = "Invoice id")
    ),
    responses(
        (status = 200, description = "Invoice with its line items", body = Invoice),
        (status = 400, description = "Id is not an integer"),
        (status = 404, description = "Invoice not found")
    ),
    security(("basic_auth" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;

    let invoice = app_state.invoice_service.get_invoice(id).await?;

    Ok((StatusCode::OK, Json(invoice)))
}

#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    request_body = UpdateStatusPayload,
    params(
        ("id" = i64, Path, description = "Invoice id")
    ),
    responses(
        (status = 200, description = "Status replaced", body = MessageResponse),
        (status = 400, description = "Unknown status or malformed body"),
        (status = 404, description = "Invoice not found")
    ),
    security(("basic_auth" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let status: InvoiceStatus = payload.status.parse()?;

    app_state.invoice_service.update_status(id, status).await?;
    tracing::debug!("Status of invoice {} changed by '{}'", id, admin.username);

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Invoice updated successfully")),
    ))
}
