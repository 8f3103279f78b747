// src/services/customer_service.rs

use std::{sync::Arc, time::Duration};

use validator::Validate;

use crate::{
    common::error::AppError,
    db::CustomerStore,
    models::customer::{CreateCustomerPayload, Customer, NewCustomer},
    services::with_deadline,
};

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
    deadline: Duration,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn create_customer(&self, payload: CreateCustomerPayload) -> Result<Customer, AppError> {
        payload.validate()?;
        let new_customer = NewCustomer::from(payload);
        let customer = with_deadline(self.deadline, self.store.create_customer(&new_customer)).await?;
        tracing::info!("Customer {} created", customer.id);
        Ok(customer)
    }

    pub async fn get_customer(&self, id: i64) -> Result<Customer, AppError> {
        with_deadline(self.deadline, self.store.find_customer(id))
            .await?
            .ok_or(AppError::CustomerNotFound)
    }
}
