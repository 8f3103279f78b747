// src/startup.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::admin_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Every invoice and customer route requires an authenticated admin.
    let invoice_routes = Router::new()
        .route(
            "/",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route(
            "/{id}",
            get(handlers::invoices::get_invoice).put(handlers::invoices::update_invoice_status),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            admin_guard,
        ));

    let customer_routes = Router::new()
        .route("/", post(handlers::customers::create_customer))
        .route("/{id}", get(handlers::customers::get_customer))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            admin_guard,
        ));

    let admin_routes = Router::new().route("/create-user", post(handlers::admin::create_user));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::admin::health))
        .nest("/api/invoices", invoice_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/admin", admin_routes)
        .with_state(app_state)
}
