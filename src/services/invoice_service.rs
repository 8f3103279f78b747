// src/services/invoice_service.rs

use std::{sync::Arc, time::Duration};

use crate::{
    common::{error::AppError, pagination::Page},
    db::InvoiceStore,
    models::invoice::{CreateInvoicePayload, Invoice, InvoiceStatus, InvoiceSummary},
    services::with_deadline,
};

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    deadline: Duration,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InvoiceStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Validates the payload, derives every total, then persists the invoice in one transaction.
    pub async fn create_invoice(&self, payload: CreateInvoicePayload) -> Result<Invoice, AppError> {
        // Nothing touches storage until validation has passed.
        let mut invoice = payload.into_invoice()?;
        invoice.calculate_total()?;

        let invoice_id = with_deadline(self.deadline, self.store.create_invoice(&invoice)).await?;
        invoice.assign_id(invoice_id);

        tracing::info!(
            "Invoice {} created for customer {} ({} items, total {})",
            invoice_id,
            invoice.customer_id,
            invoice.line_items().len(),
            invoice.total()
        );
        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: i64) -> Result<Invoice, AppError> {
        let mut invoice = with_deadline(self.deadline, self.store.get_invoice(id)).await?;
        // Stored totals are not trusted either.
        invoice.calculate_total()?;
        Ok(invoice)
    }

    pub async fn list_invoices(&self, page: Page) -> Result<Vec<InvoiceSummary>, AppError> {
        with_deadline(
            self.deadline,
            self.store.list_invoices(page.limit, page.offset),
        )
        .await
    }

    pub async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<(), AppError> {
        with_deadline(self.deadline, self.store.update_status(id, status)).await?;
        tracing::info!("Invoice {} moved to status '{}'", id, status);
        Ok(())
    }
}
