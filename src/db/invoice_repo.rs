// src/db/invoice_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, FromRow, PgConnection, PgPool, Postgres};

use crate::{
    common::error::AppError,
    db::store::InvoiceStore,
    models::{
        customer::Customer,
        invoice::{Invoice, InvoiceStatus, InvoiceSummary, LineItem},
    },
};

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =========================================================================
//  ROWS
// =========================================================================

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: i64,
    customer_id: i64,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    status: String,
    paid: bool,
    total: Decimal,
}

impl InvoiceRow {
    fn into_summary(self) -> InvoiceSummary {
        InvoiceSummary {
            id: self.id,
            customer_id: self.customer_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            total: self.total,
            status: status_from_columns(&self.status, self.paid),
        }
    }

    fn into_invoice(self, line_items: Vec<LineItem>) -> Invoice {
        Invoice {
            id: Some(self.id),
            customer_id: self.customer_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            total: self.total,
            status: status_from_columns(&self.status, self.paid),
            line_items,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    id: i64,
    invoice_id: i64,
    description: String,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        LineItem {
            id: Some(row.id),
            invoice_id: Some(row.invoice_id),
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
        }
    }
}

// The `paid` column wins over the status text; a paid text without the flag reads as draft.
pub(crate) fn status_from_columns(status: &str, paid: bool) -> InvoiceStatus {
    if paid {
        return InvoiceStatus::Paid;
    }
    match status.parse::<InvoiceStatus>() {
        Ok(InvoiceStatus::Paid) | Err(_) => InvoiceStatus::Draft,
        Ok(other) => other,
    }
}

// =========================================================================
//  STATEMENTS
// =========================================================================

/// Inserts a placeholder customer when `customer_id` is unknown.
///
/// Runs inside a savepoint of the caller's transaction so that losing a race
/// against a concurrent insert of the same id leaves the outer transaction usable.
/// Returns `true` when a placeholder was written.
pub(crate) async fn ensure_customer_exists(
    conn: &mut PgConnection,
    customer_id: i64,
) -> Result<bool, AppError> {
    let placeholder = Customer::placeholder(customer_id);
    let mut savepoint = conn.begin().await?;

    // The sequence is pushed past explicit ids so later generated ids never collide.
    let result = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO customers (id, name, email, address)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            RETURNING id
        )
        SELECT setval(
            pg_get_serial_sequence('customers', 'id'),
            GREATEST(inserted.id, (SELECT MAX(id) FROM customers))
        )
        FROM inserted
        "#,
    )
    .bind(placeholder.id)
    .bind(&placeholder.name)
    .bind(&placeholder.email)
    .bind(&placeholder.address)
    .fetch_optional(&mut *savepoint)
    .await;

    match result {
        Ok(row) => {
            savepoint.commit().await?;
            Ok(row.is_some())
        }
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            savepoint.rollback().await?;
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

async fn insert_header<'e, E>(executor: E, invoice: &Invoice) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoices (customer_id, issue_date, due_date, status, paid, total)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(invoice.customer_id)
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.status.as_str())
    .bind(invoice.status.is_paid())
    .bind(invoice.total())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

async fn insert_line_item<'e, E>(executor: E, invoice_id: i64, item: &LineItem) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO line_items (invoice_id, description, quantity, unit_price, total)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(invoice_id)
    .bind(&item.description)
    .bind(item.quantity())
    .bind(item.unit_price())
    .bind(item.total())
    .execute(executor)
    .await?;

    Ok(())
}

// =========================================================================
//  STORE
// =========================================================================

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn create_invoice(&self, invoice: &Invoice) -> Result<i64, AppError> {
        // Dropping `tx` on any early return rolls the whole invoice back.
        let mut tx = self.pool.begin().await?;

        if ensure_customer_exists(&mut tx, invoice.customer_id).await? {
            tracing::warn!(
                "Customer {} did not exist; created a placeholder record",
                invoice.customer_id
            );
        }

        let invoice_id = insert_header(&mut *tx, invoice).await?;

        for item in invoice.line_items() {
            insert_line_item(&mut *tx, invoice_id, item).await?;
        }

        tx.commit().await?;
        Ok(invoice_id)
    }

    async fn get_invoice(&self, id: i64) -> Result<Invoice, AppError> {
        let header = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, customer_id, issue_date, due_date, status, paid, total
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InvoiceNotFound)?;

        let items = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, invoice_id, description, quantity, unit_price, total
            FROM line_items
            WHERE invoice_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(header.into_invoice(items.into_iter().map(LineItem::from).collect()))
    }

    async fn list_invoices(&self, limit: i64, offset: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, customer_id, issue_date, due_date, status, paid, total
            FROM invoices
            ORDER BY issue_date DESC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InvoiceRow::into_summary).collect())
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE invoices SET status = $1, paid = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(status.is_paid())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvoiceNotFound);
        }
        Ok(())
    }
}
