// src/db/store.rs

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        customer::{Customer, NewCustomer},
        invoice::{Invoice, InvoiceStatus, InvoiceSummary},
    },
};

/// Persistence boundary for invoices and their line items.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Writes the header and every line item atomically and returns the new invoice id.
    /// A missing customer is created as a placeholder inside the same unit of work.
    async fn create_invoice(&self, invoice: &Invoice) -> Result<i64, AppError>;

    /// Header plus line items ordered by item id. `InvoiceNotFound` when absent.
    async fn get_invoice(&self, id: i64) -> Result<Invoice, AppError>;

    /// Page of headers ordered by issue date (newest first), then insertion order.
    async fn list_invoices(&self, limit: i64, offset: i64) -> Result<Vec<InvoiceSummary>, AppError>;

    /// `InvoiceNotFound` when no row matched the id.
    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<(), AppError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, AppError>;

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// `UsernameAlreadyExists` on a duplicate username.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError>;
}
