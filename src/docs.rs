// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Invoices ---
        handlers::invoices::create_invoice,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice_status,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::get_customer,

        // --- Admin ---
        handlers::admin::create_user,
        handlers::admin::health,
    ),
    components(
        schemas(
            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::LineItem,
            models::invoice::Invoice,
            models::invoice::InvoiceSummary,
            models::invoice::LineItemPayload,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateStatusPayload,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CreateCustomerPayload,

            // --- Auth ---
            models::auth::CreateUserPayload,
            models::auth::MessageResponse,
        )
    ),
    tags(
        (name = "Invoices", description = "Invoice creation, listing and status changes"),
        (name = "Customers", description = "Customer records"),
        (name = "Admin", description = "Bootstrap and health")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Basic)
            ),
        );
    }
}
