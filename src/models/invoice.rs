// src/models/invoice.rs

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::common::error::AppError;

// --- Status ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            other => Err(AppError::InvalidPayload(format!(
                "Unknown invoice status '{other}'"
            ))),
        }
    }
}

// --- Money ---

/// Largest amount a NUMERIC(12,2) column holds: 9,999,999,999.99.
// 999_999_999_999 split into its low and mid 32-bit words, scale 2.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn amount_too_large(field: &'static str) -> AppError {
    let mut err = ValidationError::new("range");
    err.add_param("max".into(), &MAX_AMOUNT.to_string());
    err.message = Some("Amount exceeds 9999999999.99".into());

    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    AppError::ValidationError(errors)
}

// `quantity * unit_price` rounded to cents, or `None` past `MAX_AMOUNT`.
fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(|total| total.round_dp(2))
        .filter(|total| total.abs() <= MAX_AMOUNT)
}

// --- Line items ---

/// One billable entry of an invoice.
///
/// `total` is derived from `quantity` and `unit_price` and has no setter.
/// Every constructor and setter rejects amounts that do not fit in storage.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 1)]
    pub id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 1)]
    pub invoice_id: Option<i64>,

    #[schema(example = "Consulting hours")]
    pub description: String,

    #[schema(example = 2)]
    pub(crate) quantity: i32,

    #[schema(value_type = f64, example = 10.5)]
    pub(crate) unit_price: Decimal,

    #[schema(value_type = f64, example = 21.0)]
    pub(crate) total: Decimal,
}

impl LineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self, AppError> {
        let mut item = Self {
            id: None,
            invoice_id: None,
            description: description.into(),
            quantity,
            unit_price,
            total: Decimal::ZERO,
        };
        item.recalculate()?;
        Ok(item)
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn set_quantity(&mut self, quantity: i32) -> Result<(), AppError> {
        let total = line_total(quantity, self.unit_price).ok_or_else(|| amount_too_large("line_items"))?;
        self.quantity = quantity;
        self.total = total;
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<(), AppError> {
        let total = line_total(self.quantity, unit_price).ok_or_else(|| amount_too_large("line_items"))?;
        self.unit_price = unit_price;
        self.total = total;
        Ok(())
    }

    fn recalculate(&mut self) -> Result<Decimal, AppError> {
        self.total = line_total(self.quantity, self.unit_price)
            .ok_or_else(|| amount_too_large("line_items"))?;
        Ok(self.total)
    }
}

// --- Invoice ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Invoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 42)]
    pub id: Option<i64>,

    #[schema(example = 7)]
    pub customer_id: i64,

    #[schema(example = "2025-12-31")]
    pub issue_date: NaiveDate,

    #[schema(example = "2026-01-14")]
    pub due_date: NaiveDate,

    #[schema(value_type = f64, example = 86.0)]
    pub(crate) total: Decimal,

    pub status: InvoiceStatus,

    pub(crate) line_items: Vec<LineItem>,
}

impl Invoice {
    pub fn new(
        customer_id: i64,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        status: InvoiceStatus,
        line_items: Vec<LineItem>,
    ) -> Result<Self, AppError> {
        let mut invoice = Self {
            id: None,
            customer_id,
            issue_date,
            due_date,
            total: Decimal::ZERO,
            status,
            line_items,
        };
        invoice.calculate_total()?;
        Ok(invoice)
    }

    /// Recomputes every line total, then the invoice total as their sum.
    /// Fails with a validation error when any amount leaves the storable range.
    pub fn calculate_total(&mut self) -> Result<Decimal, AppError> {
        let mut total = Decimal::ZERO;
        for item in &mut self.line_items {
            let line = item.recalculate()?;
            total = total
                .checked_add(line)
                .filter(|sum| sum.abs() <= MAX_AMOUNT)
                .ok_or_else(|| amount_too_large("total"))?;
        }
        self.total = total;
        Ok(self.total)
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Stamps the store-generated id on the invoice and its items.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
        for item in &mut self.line_items {
            item.invoice_id = Some(id);
        }
    }
}

/// List view of an invoice: the header without line items.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InvoiceSummary {
    pub id: i64,
    pub customer_id: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[schema(value_type = f64, example = 86.0)]
    pub total: Decimal,
    pub status: InvoiceStatus,
}

impl InvoiceSummary {
    // Summaries only exist for stored invoices, so the id comes from the store.
    pub fn for_stored(id: i64, invoice: &Invoice) -> Self {
        Self {
            id,
            customer_id: invoice.customer_id,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            total: invoice.total,
            status: invoice.status,
        }
    }
}

// --- Payloads ---

fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Value cannot be negative".into());
        return Err(err);
    }
    if *val > MAX_AMOUNT {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &MAX_AMOUNT.to_string());
        err.message = Some("Amount exceeds 9999999999.99".into());
        return Err(err);
    }
    if val.normalize().scale() > 2 {
        let mut err = ValidationError::new("precision");
        err.message = Some("At most two decimal places are allowed".into());
        return Err(err);
    }
    Ok(())
}

// `0001-01-01` is what zero-valued timestamps serialize to; treat it as unset.
fn validate_not_zero_date(val: &NaiveDate) -> Result<(), ValidationError> {
    if NaiveDate::from_ymd_opt(1, 1, 1) == Some(*val) {
        let mut err = ValidationError::new("required");
        err.message = Some("Date is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LineItemPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    #[schema(example = "Consulting hours")]
    pub description: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = f64, example = 10.5)]
    pub unit_price: Decimal,
}

/// Body of `POST /api/invoices`. Any `total` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoicePayload {
    #[serde(default, alias = "client_id")]
    #[validate(range(min = 1, message = "customer_id is required"))]
    #[schema(example = 7)]
    pub customer_id: i64,

    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[validate(required(message = "issue_date is required"), custom(function = "validate_not_zero_date"))]
    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub issue_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[validate(required(message = "due_date is required"), custom(function = "validate_not_zero_date"))]
    #[schema(value_type = String, format = Date, example = "2026-01-14")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: Option<InvoiceStatus>,

    #[serde(default)]
    #[validate(length(min = 1, message = "At least one line item is required"), nested)]
    pub line_items: Vec<LineItemPayload>,
}

impl CreateInvoicePayload {
    /// Builds the aggregate; totals are computed here and never read from the body.
    pub fn into_invoice(self) -> Result<Invoice, AppError> {
        self.validate()?;

        let (Some(issue_date), Some(due_date)) = (self.issue_date, self.due_date) else {
            return Err(AppError::InvalidPayload("Missing required fields".into()));
        };

        let line_items = self
            .line_items
            .into_iter()
            .map(|item| LineItem::new(item.description, item.quantity, item.unit_price))
            .collect::<Result<Vec<_>, _>>()?;

        Invoice::new(
            self.customer_id,
            issue_date,
            due_date,
            self.status.unwrap_or_default(),
            line_items,
        )
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    #[schema(example = "paid")]
    pub status: String,
}

// Accepts `2025-12-31` as well as RFC 3339 timestamps like `2025-12-31T00:00:00Z`.
pub(crate) mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{value}'"))),
        }
    }
}
