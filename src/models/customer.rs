// src/models/customer.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    #[schema(example = 7)]
    pub id: i64,

    #[schema(example = "Acme Ltd.")]
    pub name: String,

    #[schema(example = "billing@acme.test")]
    pub email: String,

    #[schema(example = "1 Main Street")]
    pub address: String,
}

impl Customer {
    // Stand-in record written when an invoice references an unknown customer.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: format!("Customer #{id}"),
            email: String::new(),
            address: String::new(),
        }
    }
}

// Fields of a customer before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Acme Ltd.")]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Email is invalid"))]
    #[schema(example = "billing@acme.test")]
    pub email: Option<String>,

    #[serde(default)]
    #[schema(example = "1 Main Street")]
    pub address: Option<String>,
}

impl From<CreateCustomerPayload> for NewCustomer {
    fn from(payload: CreateCustomerPayload) -> Self {
        Self {
            name: payload.name.trim().to_string(),
            email: payload.email.unwrap_or_default(),
            address: payload.address.unwrap_or_default(),
        }
    }
}
