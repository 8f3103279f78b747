// src/db/memory.rs

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    db::store::{CustomerStore, InvoiceStore, UserStore},
    models::{
        auth::User,
        customer::{Customer, NewCustomer},
        invoice::{Invoice, InvoiceStatus, InvoiceSummary},
    },
};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<i64, Customer>,
    invoices: BTreeMap<i64, Invoice>,
    users: BTreeMap<i64, User>,
    next_customer_id: i64,
    next_invoice_id: i64,
    next_line_item_id: i64,
    next_user_id: i64,
}

/// Process-local implementation of every store trait, used as a test double.
///
/// Writes are staged and applied under one lock, so readers never see half an
/// invoice. `fail_writes` and `set_latency` simulate storage failures and slow
/// backends; `calls` counts every store operation.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invoice_count(&self) -> usize {
        self.lock().map(|t| t.invoices.len()).unwrap_or_default()
    }

    pub fn customer(&self, id: i64) -> Option<Customer> {
        self.lock().ok().and_then(|t| t.customers.get(&id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory store mutex poisoned: {}", e).into())
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn create_invoice(&self, invoice: &Invoice) -> Result<i64, AppError> {
        self.enter().await;
        self.check_writable()?;

        let mut tables = self.lock()?;

        if !tables.customers.contains_key(&invoice.customer_id) {
            tracing::warn!(
                "Customer {} did not exist; created a placeholder record",
                invoice.customer_id
            );
            tables
                .customers
                .insert(invoice.customer_id, Customer::placeholder(invoice.customer_id));
            tables.next_customer_id = tables.next_customer_id.max(invoice.customer_id);
        }

        tables.next_invoice_id += 1;
        let invoice_id = tables.next_invoice_id;

        let mut stored = invoice.clone();
        stored.assign_id(invoice_id);
        for item in &mut stored.line_items {
            tables.next_line_item_id += 1;
            item.id = Some(tables.next_line_item_id);
        }
        tables.invoices.insert(invoice_id, stored);

        Ok(invoice_id)
    }

    async fn get_invoice(&self, id: i64) -> Result<Invoice, AppError> {
        self.enter().await;
        self.lock()?
            .invoices
            .get(&id)
            .cloned()
            .ok_or(AppError::InvoiceNotFound)
    }

    async fn list_invoices(&self, limit: i64, offset: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        self.enter().await;
        let tables = self.lock()?;

        let mut summaries: Vec<InvoiceSummary> = tables
            .invoices
            .iter()
            .map(|(id, invoice)| InvoiceSummary::for_stored(*id, invoice))
            .collect();
        summaries.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(a.id.cmp(&b.id)));

        Ok(summaries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<(), AppError> {
        self.enter().await;
        self.check_writable()?;

        let mut tables = self.lock()?;
        let invoice = tables
            .invoices
            .get_mut(&id)
            .ok_or(AppError::InvoiceNotFound)?;
        invoice.status = status;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, AppError> {
        self.enter().await;
        self.check_writable()?;

        let mut tables = self.lock()?;
        tables.next_customer_id += 1;
        let created = Customer {
            id: tables.next_customer_id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            address: customer.address.clone(),
        };
        tables.customers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, AppError> {
        self.enter().await;
        Ok(self.lock()?.customers.get(&id).cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.enter().await;
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        self.enter().await;
        self.check_writable()?;

        let mut tables = self.lock()?;
        if tables.users.values().any(|user| user.username == username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}
