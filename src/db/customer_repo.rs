// src/db/customer_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::store::CustomerStore,
    models::customer::{Customer, NewCustomer},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, AppError> {
        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, address)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, address
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, address FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }
}
